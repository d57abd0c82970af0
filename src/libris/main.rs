use clap::Parser;
use colored::*;
use directories::ProjectDirs;
use libris::api::{Backend, CatalogApi};
use libris::auth::AuthSession;
use libris::config::{LibrisConfig, KEYS};
use libris::context::LibraryContext;
use libris::envelope::Envelope;
use libris::error::{LibrisError, Result};
use libris::forms::{
    AuthorForm, BookEdit, BookForm, InventoryForm, LoginForm, StoreEdit, StoreForm,
};
use libris::logging;
use libris::model::{Ack, EntityKind, Id, Store};
use libris::store::fs::FileStore;
use libris::views::{
    self, AuthorShelf, AuthorSummary, BookListing, InventoryLine, StoreSummary,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use unicode_width::UnicodeWidthStr;

mod args;
use args::{AuthorAction, BookAction, Cli, Commands, InventoryAction, StoreAction};

const ENV_HOME: &str = "LIBRIS_HOME";

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let json = cli.json;

    if let Err(e) = run(cli) {
        report_error(&e, json);
        std::process::exit(1);
    }
}

struct AppContext {
    library: LibraryContext<Backend>,
    session: AuthSession<FileStore>,
    json: bool,
}

fn run(cli: Cli) -> Result<()> {
    let data_dir = data_dir()?;

    let command = match cli.command {
        Some(Commands::Config { key, value }) => {
            return handle_config(&data_dir, key.as_deref(), value.as_deref(), cli.json)
        }
        Some(command) => command,
        None => Commands::Books { action: None },
    };

    let mut ctx = init_context(&data_dir, cli.json)?;
    match command {
        Commands::Books { action } => {
            handle_books(&mut ctx, action.unwrap_or(BookAction::List { search: None }))
        }
        Commands::Authors { action } => {
            handle_authors(&mut ctx, action.unwrap_or(AuthorAction::List { search: None }))
        }
        Commands::Stores { action } => {
            handle_stores(&mut ctx, action.unwrap_or(StoreAction::List { search: None }))
        }
        Commands::Inventory { action } => handle_inventory(&mut ctx, action),
        Commands::Login { email, password } => handle_login(&mut ctx, &email, &password),
        Commands::Logout => handle_logout(&mut ctx),
        Commands::Whoami => handle_whoami(&ctx),
        Commands::Config { key, value } => {
            handle_config(&data_dir, key.as_deref(), value.as_deref(), cli.json)
        }
    }
}

fn data_dir() -> Result<PathBuf> {
    if let Some(home) = std::env::var_os(ENV_HOME).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    ProjectDirs::from("com", "libris", "libris")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| LibrisError::Config("Could not determine data dir".into()))
}

fn init_context(data_dir: &Path, json: bool) -> Result<AppContext> {
    let config = LibrisConfig::resolve(data_dir)?;
    let api = CatalogApi::new(Backend::from_config(&config, data_dir));
    let library = LibraryContext::new(api).with_orphan_policy(config.orphans);

    let mut session = AuthSession::new(FileStore::new(data_dir));
    session.restore(library.api());

    Ok(AppContext {
        library,
        session,
        json,
    })
}

// --- Books ---

fn handle_books(ctx: &mut AppContext, action: BookAction) -> Result<()> {
    match action {
        BookAction::List { search } => {
            ctx.library.load()?;
            let listings = ctx.library.book_listings();
            let shown: Vec<&BookListing> = match search.as_deref() {
                Some(term) => views::search_books(&listings, term),
                None => listings.iter().collect(),
            };
            emit(ctx, &shown, |b| print_books(b))
        }
        BookAction::Show { id } => {
            ctx.library.load()?;
            let listing = ctx
                .library
                .book_listings()
                .into_iter()
                .find(|l| l.id == id)
                .ok_or(LibrisError::NotFound(EntityKind::Book))?;
            emit(ctx, &listing, print_book)
        }
        BookAction::Add {
            name,
            author,
            pages,
        } => {
            ctx.session.require_user()?;
            ctx.library.load()?;
            let book = ctx.library.add_book_form(&BookForm {
                name,
                author_id: author,
                page_count: pages,
            })?;
            emit(ctx, &book, |b| {
                print_success(&format!("Added book {}: {}", b.id, b.name))
            })
        }
        BookAction::Edit {
            id,
            name,
            author,
            pages,
        } => {
            ctx.session.require_user()?;
            ctx.library.load()?;
            let book = ctx.library.edit_book_form(
                id,
                &BookEdit {
                    name,
                    author_id: author,
                    page_count: pages,
                },
            )?;
            emit(ctx, &book, |b| {
                print_success(&format!("Updated book {}: {}", b.id, b.name))
            })
        }
        BookAction::Delete { id } => {
            ctx.session.require_user()?;
            ctx.library.load()?;
            ctx.library.delete_book(id)?;
            emit(ctx, &Ack::ok(), |_| {
                print_success(&format!("Deleted book {}", id))
            })
        }
    }
}

// --- Authors ---

fn handle_authors(ctx: &mut AppContext, action: AuthorAction) -> Result<()> {
    match action {
        AuthorAction::List { search } => {
            ctx.library.load()?;
            let summaries = ctx.library.author_summaries();
            let shown: Vec<&AuthorSummary> = match search.as_deref() {
                Some(term) => views::search_authors(&summaries, term),
                None => summaries.iter().collect(),
            };
            emit(ctx, &shown, |a| print_authors(a))
        }
        AuthorAction::Show { id } => {
            ctx.library.load()?;
            let summary = ctx
                .library
                .author_summaries()
                .into_iter()
                .find(|a| a.author.id == id)
                .ok_or(LibrisError::NotFound(EntityKind::Author))?;
            emit(ctx, &summary, |a| print_authors(&[a]))
        }
        AuthorAction::Add { name } => {
            ctx.session.require_user()?;
            ctx.library.load()?;
            let author = ctx.library.add_author_form(&AuthorForm {
                name: name.join(" "),
            })?;
            emit(ctx, &author, |a| {
                print_success(&format!("Added author {}: {}", a.id, a.full_name()))
            })
        }
        AuthorAction::Rename { id, name } => {
            ctx.session.require_user()?;
            ctx.library.load()?;
            let author = ctx.library.rename_author(id, &name.join(" "))?;
            emit(ctx, &author, |a| {
                print_success(&format!("Renamed author {} to {}", a.id, a.full_name()))
            })
        }
        AuthorAction::Delete { id } => {
            ctx.session.require_user()?;
            ctx.library.load()?;
            ctx.library.delete_author(id)?;
            emit(ctx, &Ack::ok(), |_| {
                print_success(&format!("Deleted author {}", id))
            })
        }
    }
}

// --- Stores ---

fn handle_stores(ctx: &mut AppContext, action: StoreAction) -> Result<()> {
    match action {
        StoreAction::List { search } => {
            ctx.library.load()?;
            let summaries = ctx.library.store_summaries();
            let shown: Vec<&StoreSummary> = match search.as_deref() {
                Some(term) => views::search_stores(&summaries, term),
                None => summaries.iter().collect(),
            };
            emit(ctx, &shown, |s| print_stores(s))
        }
        StoreAction::Show { id } => {
            ctx.library.load()?;
            let summary = ctx
                .library
                .store_summaries()
                .into_iter()
                .find(|s| s.store.id == id)
                .ok_or(LibrisError::NotFound(EntityKind::Store))?;
            let lines = ctx.library.store_inventory(id);
            print_or_emit_store(ctx, &summary, &lines)
        }
        StoreAction::Add { name, address } => {
            ctx.session.require_user()?;
            ctx.library.load()?;
            let store = ctx.library.add_store_form(&StoreForm { name, address })?;
            emit(ctx, &store, |s| {
                print_success(&format!("Added store {}: {}", s.id, s.name))
            })
        }
        StoreAction::Edit { id, name, address } => {
            ctx.session.require_user()?;
            ctx.library.load()?;
            let store = ctx
                .library
                .edit_store_form(id, &StoreEdit { name, address })?;
            emit(ctx, &store, |s| {
                print_success(&format!("Updated store {}: {}", s.id, s.full_address()))
            })
        }
        StoreAction::Delete { id } => {
            ctx.session.require_user()?;
            ctx.library.load()?;
            ctx.library.delete_store(id)?;
            emit(ctx, &Ack::ok(), |_| {
                print_success(&format!("Deleted store {}", id))
            })
        }
    }
}

#[derive(Serialize)]
struct StoreDetail<'a> {
    #[serde(flatten)]
    summary: &'a StoreSummary,
    inventory: &'a [InventoryLine],
}

fn print_or_emit_store(
    ctx: &AppContext,
    summary: &StoreSummary,
    lines: &[InventoryLine],
) -> Result<()> {
    let detail = StoreDetail {
        summary,
        inventory: lines,
    };
    emit(ctx, &detail, |d| {
        print_stores(&[d.summary]);
        println!();
        let refs: Vec<&InventoryLine> = d.inventory.iter().collect();
        print_inventory(&refs);
    })
}

// --- Inventory ---

fn find_store(ctx: &AppContext, id: Id) -> Result<Store> {
    ctx.library
        .stores()
        .items()
        .iter()
        .find(|s| s.id == id)
        .cloned()
        .ok_or(LibrisError::NotFound(EntityKind::Store))
}

fn handle_inventory(ctx: &mut AppContext, action: InventoryAction) -> Result<()> {
    match action {
        InventoryAction::List {
            store,
            search,
            by_author,
        } => {
            ctx.library.load()?;
            find_store(ctx, store)?;
            if by_author && search.is_none() {
                let shelves = ctx.library.store_inventory_by_author(store);
                return emit(ctx, &shelves, |s| print_shelves(s));
            }
            let lines = ctx.library.store_inventory(store);
            let shown: Vec<&InventoryLine> = match search.as_deref() {
                Some(term) => views::search_inventory(&lines, term),
                None => lines.iter().collect(),
            };
            if by_author {
                let shelves = views::store_inventory_by_author(shown.iter().copied());
                emit(ctx, &shelves, |s| print_shelves(s))
            } else {
                emit(ctx, &shown, |l| print_inventory(l))
            }
        }
        InventoryAction::Available { store } => {
            ctx.library.load()?;
            find_store(ctx, store)?;
            let books = ctx.library.available_books(store);
            emit(ctx, &books, |books| {
                if books.is_empty() {
                    println!("This store carries every book.");
                }
                for book in books {
                    println!("{} {}", format!("{:>4}.", book.id).yellow(), book.name);
                }
            })
        }
        InventoryAction::Add { store, book, price } => {
            ctx.session.require_user()?;
            ctx.library.load()?;
            let store = find_store(ctx, store)?;
            let item = ctx.library.add_inventory_form(&InventoryForm {
                store_id: store.id,
                book_id: book,
                price,
            })?;
            emit(ctx, &item, |i| {
                print_success(&format!(
                    "Added item {} to {} at {}",
                    i.id,
                    store.name,
                    money(i.price)
                ))
            })
        }
        InventoryAction::Price { id, price } => {
            ctx.session.require_user()?;
            ctx.library.load()?;
            let item = ctx.library.set_inventory_price(id, &price)?;
            emit(ctx, &item, |i| {
                print_success(&format!("Item {} now costs {}", i.id, money(i.price)))
            })
        }
        InventoryAction::Delete { id } => {
            ctx.session.require_user()?;
            ctx.library.load()?;
            ctx.library.delete_inventory_item(id)?;
            emit(ctx, &Ack::ok(), |_| {
                print_success(&format!("Deleted item {}", id))
            })
        }
        InventoryAction::Remove { store, book } => {
            ctx.session.require_user()?;
            ctx.library.load()?;
            ctx.library.remove_book_from_store(store, book)?;
            emit(ctx, &Ack::ok(), |_| {
                print_success(&format!("Removed book {} from store {}", book, store))
            })
        }
    }
}

// --- Session ---

fn handle_login(ctx: &mut AppContext, email: &str, password: &str) -> Result<()> {
    LoginForm {
        email: email.to_string(),
        password: password.to_string(),
    }
    .validate()?;
    let user = ctx.session.login(ctx.library.api(), email, password)?;
    emit(ctx, &user, |u| {
        print_success(&format!("Signed in as {} <{}>", u.name, u.email))
    })
}

fn handle_logout(ctx: &mut AppContext) -> Result<()> {
    ctx.session.logout(ctx.library.api())?;
    emit(ctx, &Ack::ok(), |_| print_success("Signed out."))
}

fn handle_whoami(ctx: &AppContext) -> Result<()> {
    emit(ctx, &ctx.session.user(), |user| match user {
        Some(u) => println!("{} <{}> {}", u.name.bold(), u.email, u.role.dimmed()),
        None => println!("Not signed in."),
    })
}

// --- Config ---

fn handle_config(
    data_dir: &Path,
    key: Option<&str>,
    value: Option<&str>,
    json: bool,
) -> Result<()> {
    let shown: BTreeMap<String, String> = match (key, value) {
        (None, _) => {
            let config = LibrisConfig::resolve(data_dir)?;
            KEYS.iter()
                .map(|k| config.get(k).map(|v| (k.to_string(), v)))
                .collect::<Result<_>>()?
        }
        (Some(key), None) => {
            let config = LibrisConfig::resolve(data_dir)?;
            BTreeMap::from([(key.to_string(), config.get(key)?)])
        }
        (Some(key), Some(value)) => {
            // Only file values are saved, never environment overrides
            let mut config = LibrisConfig::load(data_dir)?;
            config.set(key, value)?;
            config.save(data_dir)?;
            BTreeMap::from([(key.to_string(), config.get(key)?)])
        }
    };

    if json {
        print_json(&Envelope::ok(&shown))
    } else {
        for (k, v) in &shown {
            println!("{} = {}", k, v);
        }
        Ok(())
    }
}

// --- Output ---

fn emit<T: Serialize>(ctx: &AppContext, data: &T, human: impl FnOnce(&T)) -> Result<()> {
    if ctx.json {
        print_json(&Envelope::ok(data))
    } else {
        human(data);
        Ok(())
    }
}

fn print_json<T: Serialize>(envelope: &Envelope<T>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(envelope)?);
    Ok(())
}

fn report_error(e: &LibrisError, json: bool) {
    if json {
        let envelope: Envelope<()> = Envelope::failure(e.to_string());
        if print_json(&envelope).is_ok() {
            return;
        }
    }

    match e {
        LibrisError::Validation(errors) => {
            for (field, message) in errors.iter() {
                eprintln!("{} {}", format!("{}:", field).yellow(), message);
            }
        }
        LibrisError::Unauthenticated => {
            eprintln!("Error: {}", e);
            eprintln!(
                "{}",
                "Sign in first: libris login <email> <password>".dimmed()
            );
        }
        _ => eprintln!("Error: {}", e),
    }
}

fn print_success(message: &str) {
    println!("{}", message.green());
}

fn money(price: f64) -> String {
    format!("${:.2}", price)
}

const TITLE_WIDTH: usize = 32;
const NAME_WIDTH: usize = 24;
const ADDRESS_WIDTH: usize = 40;

fn print_books(books: &[&BookListing]) {
    if books.is_empty() {
        println!("No books found.");
        return;
    }

    for book in books {
        let offers = if book.stores.is_empty() {
            "not in stock".dimmed()
        } else {
            book.stores
                .iter()
                .map(|o| format!("{} {}", o.name, money(o.price)))
                .collect::<Vec<_>>()
                .join(", ")
                .normal()
        };
        println!(
            "{} {} {} {}",
            format!("{:>4}.", book.id).yellow(),
            fit(&book.title, TITLE_WIDTH).bold(),
            fit(&book.author, NAME_WIDTH),
            offers
        );
    }
}

fn print_book(book: &BookListing) {
    println!("{} {}", format!("{}.", book.id).yellow(), book.title.bold());
    println!("by {}, {} pages", book.author, book.page_count);
    if book.stores.is_empty() {
        println!("{}", "Not carried by any store.".dimmed());
    }
    for offer in &book.stores {
        println!("  {} {}", fit(&offer.name, NAME_WIDTH), money(offer.price));
    }
}

fn print_authors(authors: &[&AuthorSummary]) {
    if authors.is_empty() {
        println!("No authors found.");
        return;
    }

    for summary in authors {
        let count = match summary.book_count {
            1 => "1 book".to_string(),
            n => format!("{} books", n),
        };
        println!(
            "{} {} {}",
            format!("{:>4}.", summary.author.id).yellow(),
            fit(&summary.full_name, TITLE_WIDTH),
            count.dimmed()
        );
    }
}

fn print_stores(stores: &[&StoreSummary]) {
    if stores.is_empty() {
        println!("No stores found.");
        return;
    }

    for summary in stores {
        println!(
            "{} {} {} {}",
            format!("{:>4}.", summary.store.id).yellow(),
            fit(&summary.store.name, NAME_WIDTH).bold(),
            fit(&summary.full_address, ADDRESS_WIDTH),
            format!(
                "{} items, avg {}",
                summary.item_count,
                money(summary.average_price)
            )
            .dimmed()
        );
    }
}

fn print_inventory(lines: &[&InventoryLine]) {
    if lines.is_empty() {
        println!("No items found.");
        return;
    }

    for line in lines {
        println!(
            "{} {} {} {}",
            format!("{:>4}.", line.id).yellow(),
            fit(&line.book_name, TITLE_WIDTH),
            fit(&line.author_name, NAME_WIDTH),
            money(line.price)
        );
    }
}

fn print_shelves(shelves: &[AuthorShelf]) {
    if shelves.is_empty() {
        println!("No authors with books in this store.");
        return;
    }

    for shelf in shelves {
        println!("{}", shelf.author_name.bold());
        for line in &shelf.books {
            println!(
                "  {} {} {}",
                format!("{:>4}.", line.id).yellow(),
                fit(&line.book_name, TITLE_WIDTH),
                money(line.price)
            );
        }
    }
}

/// Truncate or pad to exactly `width` display columns.
fn fit(s: &str, width: usize) -> String {
    let truncated = if s.width() > width {
        truncate_to_width(s, width)
    } else {
        s.to_string()
    };
    let padding = width.saturating_sub(truncated.width());
    format!("{}{}", truncated, " ".repeat(padding))
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    use unicode_width::UnicodeWidthChar;

    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }

    result
}
