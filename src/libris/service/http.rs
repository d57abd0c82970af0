use super::CatalogService;
use crate::envelope::Envelope;
use crate::error::{LibrisError, Result};
use crate::model::{Ack, Author, Book, Catalog, Id, InventoryItem, LoginGrant, Record, Store, User};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::thread;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";

/// Talks to a real backend. Every response body is an [`Envelope`].
#[derive(Debug, Clone)]
pub struct HttpService {
    base_url: String,
    client: Client,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

impl HttpService {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: &str, client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!(%method, %url, "http request");
        self.client.request(method, url)
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send()?;
        let status = response.status();
        let body = response.text()?;
        // Error statuses still carry an envelope; only a non-envelope body is a
        // transport failure.
        match serde_json::from_str::<Envelope<T>>(&body) {
            Ok(envelope) => envelope.into_result(),
            Err(_) if !status.is_success() => {
                Err(LibrisError::Network(format!("HTTP {}", status)))
            }
            Err(e) => Err(LibrisError::Parse(e)),
        }
    }
}

pub fn record_path<T: Record>(id: Option<Id>) -> String {
    match id {
        Some(id) => format!("{}/{}", T::KIND.collection(), id),
        None => T::KIND.collection().to_string(),
    }
}

impl CatalogService for HttpService {
    fn list<T: Record>(&self) -> Result<Vec<T>> {
        self.send(self.request(Method::GET, &record_path::<T>(None)))
    }

    fn get<T: Record>(&self, id: Id) -> Result<T> {
        self.send(self.request(Method::GET, &record_path::<T>(Some(id))))
    }

    fn create<T: Record>(&self, draft: T::Draft) -> Result<T> {
        self.send(
            self.request(Method::POST, &record_path::<T>(None))
                .json(&draft),
        )
    }

    fn update<T: Record>(&self, id: Id, patch: T::Patch) -> Result<T> {
        self.send(
            self.request(Method::PUT, &record_path::<T>(Some(id)))
                .json(&patch),
        )
    }

    fn delete<T: Record>(&self, id: Id) -> Result<Ack> {
        self.send(self.request(Method::DELETE, &record_path::<T>(Some(id))))
    }

    fn inventory_by_store(&self, store_id: Id) -> Result<Vec<InventoryItem>> {
        self.send(self.request(Method::GET, &format!("inventory/store/{}", store_id)))
    }

    fn delete_inventory_by_store_and_book(&self, store_id: Id, book_id: Id) -> Result<Ack> {
        self.send(self.request(
            Method::DELETE,
            &format!("inventory/store/{}/book/{}", store_id, book_id),
        ))
    }

    /// Four list calls, all in flight before any is awaited.
    fn snapshot(&self) -> Result<Catalog> {
        thread::scope(|scope| {
            let books = scope.spawn(|| self.list::<Book>());
            let authors = scope.spawn(|| self.list::<Author>());
            let stores = scope.spawn(|| self.list::<Store>());
            let inventory = scope.spawn(|| self.list::<InventoryItem>());
            Ok(Catalog {
                books: join(books)?,
                authors: join(authors)?,
                stores: join(stores)?,
                inventory: join(inventory)?,
            })
        })
    }

    fn login(&self, email: &str, password: &str) -> Result<LoginGrant> {
        self.send(
            self.request(Method::POST, "auth/login")
                .json(&LoginRequest { email, password }),
        )
    }

    fn logout(&self) -> Result<Ack> {
        self.send(self.request(Method::POST, "auth/logout"))
    }

    fn current_user(&self, token: &str) -> Result<User> {
        self.send(self.request(Method::GET, "auth/me").bearer_auth(token))
    }
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, Result<T>>) -> Result<T> {
    handle
        .join()
        .unwrap_or_else(|_| Err(LibrisError::Network("request thread panicked".into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityKind, NewAuthor};
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::time::Duration;

    /// Answers exactly one request with `status` and `body`, returning what
    /// `call` produced and the raw request the server saw.
    fn serve_once<R>(status: &str, body: &str, call: impl FnOnce(HttpService) -> R) -> (R, String) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}/api", listener.local_addr().unwrap());

        thread::scope(|scope| {
            let server = scope.spawn(|| {
                let (mut stream, _) = listener.accept().unwrap();
                let request = read_request(&mut stream);
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).unwrap();
                request
            });
            let result = call(HttpService::new(&base_url));
            (result, server.join().unwrap())
        })
    }

    fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let body_len = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + body_len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[test]
    fn success_envelope_decodes_into_the_record() {
        let (result, request) = serve_once(
            "200 OK",
            r#"{"success":true,"data":{"id":3,"author_id":2,"name":"Kindred","page_count":264}}"#,
            |service| service.get::<Book>(3),
        );
        let book = result.unwrap();
        assert_eq!(book.name, "Kindred");
        assert_eq!(book.author_id, 2);
        assert!(request.starts_with("GET /api/books/3 "));
    }

    #[test]
    fn create_posts_the_draft_as_json() {
        let (result, request) = serve_once(
            "201 Created",
            r#"{"success":true,"data":{"id":9,"first_name":"Ada","last_name":"Lovelace"}}"#,
            |service| {
                service.create::<Author>(NewAuthor {
                    first_name: "Ada".into(),
                    last_name: "Lovelace".into(),
                })
            },
        );
        assert_eq!(result.unwrap().id, 9);
        assert!(request.starts_with("POST /api/authors "));
        assert!(request.contains(r#""first_name":"Ada""#));
    }

    #[test]
    fn failure_envelope_maps_back_to_a_typed_error() {
        let (result, _) = serve_once(
            "404 Not Found",
            r#"{"success":false,"data":null,"error":"Book not found"}"#,
            |service| service.get::<Book>(99),
        );
        assert!(matches!(
            result,
            Err(LibrisError::NotFound(EntityKind::Book))
        ));
    }

    #[test]
    fn error_status_without_an_envelope_is_a_network_failure() {
        let (result, _) = serve_once("500 Internal Server Error", "upstream exploded", |service| {
            service.list::<Store>()
        });
        match result {
            Err(LibrisError::Network(message)) => assert!(message.contains("500")),
            other => panic!("Expected network error, got {:?}", other),
        }
    }

    #[test]
    fn current_user_sends_the_bearer_token() {
        let (result, request) = serve_once(
            "200 OK",
            r#"{"success":true,"data":{"id":1,"name":"Admin User","email":"admin@library.com","role":"admin"}}"#,
            |service| service.current_user("tok-123"),
        );
        assert_eq!(result.unwrap().email, "admin@library.com");
        assert!(request.starts_with("GET /api/auth/me "));
        assert!(request
            .to_lowercase()
            .contains("authorization: bearer tok-123"));
    }

    #[test]
    fn builds_routes_from_collection_names() {
        assert_eq!(record_path::<Book>(None), "books");
        assert_eq!(record_path::<Store>(Some(3)), "stores/3");
        assert_eq!(record_path::<InventoryItem>(Some(12)), "inventory/12");
    }

    #[test]
    fn url_joins_without_double_slashes() {
        let service = HttpService::new("http://localhost:3000/api/");
        assert_eq!(service.base_url(), "http://localhost:3000/api");
        assert_eq!(
            service.url("/auth/login"),
            "http://localhost:3000/api/auth/login"
        );
    }

    #[test]
    fn unreachable_backend_is_a_network_failure() {
        let client = Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        // Port 9 (discard) on loopback is closed on any sane test machine
        let service = HttpService::with_client("http://127.0.0.1:9/api", client);
        assert!(matches!(
            service.list::<Author>(),
            Err(LibrisError::Network(_))
        ));
        assert!(matches!(service.logout(), Err(LibrisError::Network(_))));
    }
}
