use clap::{Parser, Subcommand};
use libris::model::Id;

#[derive(Parser, Debug)]
#[command(name = "libris")]
#[command(about = "Manage a catalog of books, authors, stores and inventory", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Print results as {success, data, error} JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Books with their authors and store prices
    #[command(alias = "b")]
    Books {
        #[command(subcommand)]
        action: Option<BookAction>,
    },

    /// Authors and how many books each has
    #[command(alias = "a")]
    Authors {
        #[command(subcommand)]
        action: Option<AuthorAction>,
    },

    /// Stores with item counts and average prices
    #[command(alias = "s")]
    Stores {
        #[command(subcommand)]
        action: Option<StoreAction>,
    },

    /// What each store carries
    #[command(alias = "inv")]
    Inventory {
        #[command(subcommand)]
        action: InventoryAction,
    },

    /// Sign in
    Login { email: String, password: String },

    /// Sign out
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Get or set configuration
    Config {
        /// Configuration key (api-mode, api-url, mock-delay, seed, orphans)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum BookAction {
    /// List books
    #[command(alias = "ls")]
    List {
        /// Filter by title or author
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show one book
    Show { id: Id },

    /// Add a book
    Add {
        name: String,

        /// Author id
        #[arg(short, long)]
        author: Option<Id>,

        /// Number of pages
        #[arg(short, long, default_value = "")]
        pages: String,
    },

    /// Change a book's fields
    Edit {
        id: Id,

        #[arg(long)]
        name: Option<String>,

        #[arg(short, long)]
        author: Option<Id>,

        #[arg(short, long)]
        pages: Option<String>,
    },

    /// Delete a book
    #[command(alias = "rm")]
    Delete { id: Id },
}

#[derive(Subcommand, Debug)]
pub enum AuthorAction {
    /// List authors
    #[command(alias = "ls")]
    List {
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show one author
    Show { id: Id },

    /// Add an author by full name (first word is the first name)
    Add {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },

    /// Replace an author's full name
    Rename {
        id: Id,

        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },

    /// Delete an author
    #[command(alias = "rm")]
    Delete { id: Id },
}

#[derive(Subcommand, Debug)]
pub enum StoreAction {
    /// List stores
    #[command(alias = "ls")]
    List {
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show a store and its shelf
    Show { id: Id },

    /// Add a store
    Add {
        name: String,

        /// e.g. "123 Main St, Athens, GA 30605"
        address: String,
    },

    /// Change a store's name or address
    Edit {
        id: Id,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        address: Option<String>,
    },

    /// Delete a store
    #[command(alias = "rm")]
    Delete { id: Id },
}

#[derive(Subcommand, Debug)]
pub enum InventoryAction {
    /// List a store's items
    #[command(alias = "ls")]
    List {
        /// Store id
        store: Id,

        /// Filter by book or author
        #[arg(short, long)]
        search: Option<String>,

        /// Group the items under their authors
        #[arg(long)]
        by_author: bool,
    },

    /// Books a store does not carry yet
    Available { store: Id },

    /// Put a book on a store's shelf
    Add {
        store: Id,

        #[arg(short, long)]
        book: Option<Id>,

        #[arg(short, long, default_value = "")]
        price: String,
    },

    /// Change an item's price
    Price { id: Id, price: String },

    /// Delete an item by id
    #[command(alias = "rm")]
    Delete { id: Id },

    /// Take a book off a store's shelf
    Remove {
        store: Id,

        #[arg(short, long)]
        book: Id,
    },
}
