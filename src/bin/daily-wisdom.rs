//! Daily Wisdom CLI: today's instruction, history navigation and search.
//!
//! Usage:
//!   daily-wisdom today [--refresh]
//!   daily-wisdom back | forward | history
//!   daily-wisdom show <id>
//!   daily-wisdom search [QUERY] [--tag ID]... [--category ID]... [--local] [--more N]
//!   daily-wisdom tags | categories | count
//!
//! Every invocation is one session: saved history and search criteria are
//! read from the state database at start and written back as they change.

use clap::{Parser, Subcommand};
use daily_wisdom::search::{SearchError, SearchMode, SearchOrchestrator};
use daily_wisdom::{
    telemetry, Config, DeepLink, Gateway, Hero, Instruction, InstructionId, MemoryStore, Notifier,
    OpenStore, PostgrestClient, SqliteStore, StorageAdapter, Toast, TracingNotifier,
};
use std::collections::BTreeSet;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

#[derive(Parser)]
#[command(
    name = "daily-wisdom",
    version,
    about = "One instruction a day, with history and search"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Path to a YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Path to the session state database
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Keep session state in memory only
    #[arg(long, global = true)]
    ephemeral: bool,
    /// Increase log output (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current instruction (today's pick on a first visit)
    Today {
        /// Discard today's pick and fetch a new random one
        #[arg(long)]
        refresh: bool,
    },
    /// Step back in history
    Back,
    /// Step forward in history
    Forward,
    /// Open an instruction by id, as a shared link would
    Show {
        id: i64,
    },
    /// List viewing history
    History,
    /// Search or browse the collection
    Search {
        /// Text to search for
        query: Option<String>,
        /// Require a tag (by id); repeatable
        #[arg(long = "tag")]
        tags: Vec<i64>,
        /// Allow a category (by id); repeatable
        #[arg(long = "category")]
        categories: Vec<i64>,
        /// Filter the loaded results locally instead of searching remotely
        #[arg(long)]
        local: bool,
        /// Load this many additional pages
        #[arg(long, default_value_t = 0)]
        more: usize,
        /// Forget saved search criteria first
        #[arg(long)]
        clear: bool,
    },
    /// List tags
    Tags,
    /// List categories
    Categories,
    /// Print the number of instructions
    Count,
}

/// Prints toasts to stderr.
struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, toast: Toast) {
        eprintln!("{}: {}", toast.title, toast.description);
    }
}

struct Session {
    config: Config,
    storage: Arc<StorageAdapter>,
    gateway: Arc<Gateway>,
    notifier: Arc<dyn Notifier>,
}

fn open_session(cli: &Cli) -> Result<Session, String> {
    let mut config = Config::load(cli.config.as_deref()).map_err(|e| e.to_string())?;
    if let Some(db) = &cli.db {
        config.db_path = Some(db.clone());
    }

    // Piped or redirected stderr gets toasts as log lines instead.
    let notifier: Arc<dyn Notifier> = if std::io::stderr().is_terminal() {
        Arc::new(StderrNotifier)
    } else {
        Arc::new(TracingNotifier)
    };
    let storage = if cli.ephemeral {
        StorageAdapter::with_store(Arc::new(MemoryStore::new()), notifier.clone())
    } else {
        let path = config.db_path();
        let store = SqliteStore::open(&path)
            .map_err(|e| format!("Failed to open database at {}: {}", path.display(), e))?;
        StorageAdapter::with_store(Arc::new(store), notifier.clone())
    };

    let postgrest = config.postgrest().map_err(|e| e.to_string())?;
    let client = PostgrestClient::new(&postgrest).map_err(|e| e.to_string())?;

    Ok(Session {
        config,
        storage: Arc::new(storage),
        gateway: Arc::new(Gateway::new(Arc::new(client))),
        notifier,
    })
}

impl Session {
    fn share_base(&self) -> Result<Url, String> {
        self.config.share_base().map_err(|e| e.to_string())
    }

    fn hero(&self) -> Result<Hero, String> {
        Ok(Hero::new(
            self.gateway.clone(),
            self.storage.clone(),
            self.notifier.clone(),
            DeepLink::new(self.share_base()?),
        ))
    }
}

fn print_instruction(instruction: &Instruction) {
    println!("{}", instruction.share_text());
    if !instruction.tags.is_empty() {
        println!("  tags: {}", instruction.tags.join(", "));
    }
    if !instruction.categories.is_empty() {
        println!("  categories: {}", instruction.categories.join(", "));
    }
}

fn print_hero(hero: &Hero, base: &Url) -> i32 {
    let Some(current) = hero.current() else {
        eprintln!("No instruction to show");
        return 1;
    };
    print_instruction(current);

    let (n, m) = hero.position();
    let mut footer = format!("[{} of {}]", n, m);
    if let Some(total) = hero.total_count() {
        footer.push_str(&format!(" {} instructions in the collection", total));
    }
    println!("{}", footer);
    if let Some(url) = hero.share_url(base) {
        println!("{}", url);
    }
    0
}

async fn cmd_today(session: &Session, refresh: bool) -> i32 {
    let base = match session.share_base() {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let mut hero = match session.hero() {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    if refresh {
        // No startup daily pick: refresh fetches its own.
        hero.restore();
        hero.load_count().await;
        if !hero.refresh().await {
            return 1;
        }
    } else {
        hero.initialize().await;
    }
    print_hero(&hero, &base)
}

async fn cmd_show(session: &Session, id: i64) -> i32 {
    let base = match session.share_base() {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let mut hero = match session.hero() {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    hero.restore();
    if !hero.open(InstructionId::new(id)).await {
        eprintln!("Error: instruction {} not found", id);
        return 1;
    }
    print_hero(&hero, &base)
}

/// Back/forward only touch saved history.
fn cmd_step(session: &Session, forward: bool) -> i32 {
    let base = match session.share_base() {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let mut hero = match session.hero() {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    hero.restore();
    let can_move = if forward {
        hero.can_go_forward()
    } else {
        hero.can_go_back()
    };
    if !can_move {
        session.notifier.notify(Toast::info(
            "History",
            format!(
                "Already at the {} of history.",
                if forward { "end" } else { "start" }
            ),
        ));
    } else if forward {
        hero.forward();
    } else {
        hero.back();
    }
    print_hero(&hero, &base)
}

fn cmd_history(session: &Session) -> i32 {
    let mut hero = match session.hero() {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    hero.restore();

    if hero.history().is_empty() {
        println!("No history yet.");
        return 0;
    }
    let current = hero.history().index;
    for (i, entry) in hero.history().entries.iter().enumerate() {
        let marker = if i as isize == current { ">" } else { " " };
        let origin = if entry.was_external { " (shared)" } else { "" };
        println!("{} {:>4}  {}{}", marker, entry.id.get(), entry.text, origin);
    }
    0
}

struct SearchArgs {
    query: Option<String>,
    tags: Vec<i64>,
    categories: Vec<i64>,
    local: bool,
    more: usize,
    clear: bool,
}

async fn cmd_search(session: &Session, args: SearchArgs) -> i32 {
    let mut search = SearchOrchestrator::new(
        session.gateway.clone(),
        session.storage.clone(),
        session.notifier.clone(),
    )
    .with_page_size(session.config.page_size);

    if let Err(e) = run_search(&mut search, args).await {
        eprintln!("Error: {}", e);
        return 1;
    }

    let visible = search.visible();
    for instruction in &visible {
        print_instruction(instruction);
    }
    let filtered = search.state().is_filtered();
    println!(
        "{} instruction{} {}",
        visible.len(),
        if visible.len() == 1 { "" } else { "s" },
        if filtered { "found" } else { "shown" }
    );
    if search.has_more() {
        println!("More available: rerun with --more");
    }
    0
}

async fn run_search(search: &mut SearchOrchestrator, args: SearchArgs) -> Result<(), SearchError> {
    search.start().await?;
    if args.clear {
        search.clear_filters().await?;
    }
    if args.local {
        search.set_mode(SearchMode::Local).await?;
    }
    if !args.tags.is_empty() || !args.categories.is_empty() {
        let tags: BTreeSet<i64> = args.tags.into_iter().collect();
        let categories: BTreeSet<i64> = args.categories.into_iter().collect();
        search.set_selection(tags, categories).await?;
    }
    if let Some(query) = &args.query {
        search.set_query(query).await?;
    }
    for _ in 0..args.more {
        if !search.has_more() {
            break;
        }
        search.load_more().await?;
    }
    Ok(())
}

async fn cmd_labels(session: &Session, categories: bool) -> i32 {
    let result = if categories {
        session.gateway.list_categories().await
    } else {
        session.gateway.list_tags().await
    };
    match result {
        Ok(mut labels) => {
            labels.sort_by(|a, b| a.name.cmp(&b.name));
            for label in labels {
                println!("{:>4}  {}", label.id, label.name);
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

async fn cmd_count(session: &Session) -> i32 {
    match session.gateway.count_instructions().await {
        Ok(count) => {
            println!("{}", count);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();
    telemetry::init(cli.verbose);

    let session = match open_session(&cli) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    let code = rt.block_on(async move {
        match cli.command {
            Commands::Today { refresh } => cmd_today(&session, refresh).await,
            Commands::Back => cmd_step(&session, false),
            Commands::Forward => cmd_step(&session, true),
            Commands::Show { id } => cmd_show(&session, id).await,
            Commands::History => cmd_history(&session),
            Commands::Search {
                query,
                tags,
                categories,
                local,
                more,
                clear,
            } => {
                let args = SearchArgs {
                    query,
                    tags,
                    categories,
                    local,
                    more,
                    clear,
                };
                cmd_search(&session, args).await
            }
            Commands::Tags => cmd_labels(&session, false).await,
            Commands::Categories => cmd_labels(&session, true).await,
            Commands::Count => cmd_count(&session).await,
        }
    });
    std::process::exit(code);
}
