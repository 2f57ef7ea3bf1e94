//! PPLIP CLI - client for the PPLIP travel community API
//!
//! Attraction reviews, the free and notice boards, and region lookup from
//! the terminal.

mod api;
mod auth;
mod config;
mod models;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::{attraction, board, review, ApiClient};
use config::Config;
use models::PageQuery;

#[derive(Parser)]
#[command(name = "pplip")]
#[command(about = "Command-line client for the PPLIP travel community", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the access token
    Login {
        #[arg(short, long)]
        email: Option<String>,

        #[arg(short, long)]
        password: Option<String>,

        /// Store an access token obtained elsewhere instead of signing in
        #[arg(long, conflicts_with_all = ["email", "password"])]
        token: Option<String>,
    },

    /// Log out and clear stored credentials
    Logout,

    /// Show current authentication status
    Status,

    /// Attraction reviews
    #[command(subcommand)]
    Review(ReviewCommand),

    /// Free board posts, comments and likes
    #[command(subcommand)]
    Free(FreeCommand),

    /// Notice board posts and comments
    #[command(subcommand)]
    Notice(NoticeCommand),

    /// List provinces and their districts
    Regions,
}

#[derive(Args)]
struct PageArgs {
    /// Page number
    #[arg(long)]
    page: Option<u32>,

    /// Items per page
    #[arg(long)]
    size: Option<u32>,

    /// Sort order, as understood by the server
    #[arg(long)]
    sort: Option<String>,
}

impl From<PageArgs> for PageQuery {
    fn from(args: PageArgs) -> Self {
        PageQuery::new(args.page, args.size, args.sort)
    }
}

#[derive(Subcommand)]
enum ReviewCommand {
    /// Reviews of an attraction
    List {
        attraction_id: u64,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Your own reviews
    Mine {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Write a review
    Post {
        attraction_id: u64,
        /// Review body as JSON
        #[arg(short, long)]
        data: String,
    },
    /// Edit a review
    Update {
        review_id: u64,
        #[arg(short, long)]
        data: String,
    },
    /// Delete a review
    Delete { review_id: u64 },
}

#[derive(Subcommand)]
enum FreeCommand {
    /// List posts
    List {
        #[arg(long)]
        sort: Option<String>,
    },
    /// Your own posts
    Mine {
        #[arg(long)]
        sort: Option<String>,
    },
    /// Show one post
    Show { id: u64 },
    /// Write a post
    Post {
        /// Post body as JSON
        #[arg(short, long)]
        data: String,
    },
    /// Edit a post
    Update {
        id: u64,
        #[arg(short, long)]
        data: String,
    },
    /// Delete a post
    Delete { id: u64 },
    /// List comments on a post
    Comments {
        id: u64,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Comment on a post
    Comment {
        id: u64,
        #[arg(short, long)]
        data: String,
    },
    /// Edit a comment
    EditComment {
        comment_id: u64,
        #[arg(short, long)]
        data: String,
    },
    /// Delete a comment
    DeleteComment { comment_id: u64 },
    /// Like a post
    Like { id: u64 },
    /// Remove your like
    Unlike { id: u64 },
    /// Show like state for a post
    Likes { id: u64 },
}

#[derive(Subcommand)]
enum NoticeCommand {
    /// List notices
    List,
    /// Your own notices
    Mine,
    /// Show one notice
    Show { id: u64 },
    /// Publish a notice
    Post {
        /// Notice body as JSON
        #[arg(short, long)]
        data: String,
    },
    /// Edit a notice
    Update {
        id: u64,
        #[arg(short, long)]
        data: String,
    },
    /// Delete a notice
    Delete { id: u64 },
    /// List comments on a notice
    Comments {
        id: u64,
        #[arg(long)]
        page: Option<u32>,
    },
    /// Comment on a notice
    Comment {
        id: u64,
        #[arg(short, long)]
        data: String,
    },
    /// Edit a comment
    EditComment {
        comment_id: u64,
        #[arg(short, long)]
        data: String,
    },
    /// Delete a comment
    DeleteComment { comment_id: u64 },
}

fn parse_body(data: &str) -> Result<Value> {
    serde_json::from_str(data).context("--data must be valid JSON")
}

async fn run_review(client: &ApiClient, command: ReviewCommand) -> Result<Value> {
    let payload = match command {
        ReviewCommand::List {
            attraction_id,
            page,
        } => review::list_reviews(client, attraction_id, &page.into()).await?,
        ReviewCommand::Mine { page } => review::list_my_reviews(client, &page.into()).await?,
        ReviewCommand::Post {
            attraction_id,
            data,
        } => review::post_review(client, attraction_id, &parse_body(&data)?).await?,
        ReviewCommand::Update { review_id, data } => {
            review::update_review(client, review_id, &parse_body(&data)?).await?
        }
        ReviewCommand::Delete { review_id } => review::delete_review(client, review_id).await?,
    };
    Ok(payload)
}

async fn run_free(client: &ApiClient, command: FreeCommand) -> Result<Value> {
    let payload = match command {
        FreeCommand::List { sort } => board::list_free_boards(client, sort.as_deref()).await?,
        FreeCommand::Mine { sort } => board::list_my_free_boards(client, sort.as_deref()).await?,
        FreeCommand::Show { id } => board::get_free_board(client, id).await?,
        FreeCommand::Post { data } => board::post_free_board(client, &parse_body(&data)?).await?,
        FreeCommand::Update { id, data } => {
            board::update_free_board(client, id, &parse_body(&data)?).await?
        }
        FreeCommand::Delete { id } => board::delete_free_board(client, id).await?,
        FreeCommand::Comments { id, page } => {
            board::list_free_board_comments(client, id, &page.into()).await?
        }
        FreeCommand::Comment { id, data } => {
            board::post_free_board_comment(client, id, &parse_body(&data)?).await?
        }
        FreeCommand::EditComment { comment_id, data } => {
            board::update_free_board_comment(client, comment_id, &parse_body(&data)?).await?
        }
        FreeCommand::DeleteComment { comment_id } => {
            board::delete_free_board_comment(client, comment_id).await?
        }
        FreeCommand::Like { id } => board::like_free_board(client, id).await?,
        FreeCommand::Unlike { id } => board::unlike_free_board(client, id).await?,
        FreeCommand::Likes { id } => board::get_free_board_like(client, id).await?,
    };
    Ok(payload)
}

async fn run_notice(client: &ApiClient, command: NoticeCommand) -> Result<Value> {
    let payload = match command {
        NoticeCommand::List => board::list_notices(client).await?,
        NoticeCommand::Mine => board::list_my_notices(client).await?,
        NoticeCommand::Show { id } => board::get_notice(client, id).await?,
        NoticeCommand::Post { data } => board::post_notice(client, &parse_body(&data)?).await?,
        NoticeCommand::Update { id, data } => {
            board::update_notice(client, id, &parse_body(&data)?).await?
        }
        NoticeCommand::Delete { id } => board::delete_notice(client, id).await?,
        NoticeCommand::Comments { id, page } => {
            board::list_notice_comments(client, id, page).await?
        }
        NoticeCommand::Comment { id, data } => {
            board::post_notice_comment(client, id, &parse_body(&data)?).await?
        }
        NoticeCommand::EditComment { comment_id, data } => {
            board::update_notice_comment(client, comment_id, &parse_body(&data)?).await?
        }
        NoticeCommand::DeleteComment { comment_id } => {
            board::delete_notice_comment(client, comment_id).await?
        }
    };
    Ok(payload)
}

async fn show_regions(client: &ApiClient) -> Result<()> {
    let regions = attraction::get_regions(client).await?;

    println!("\nRegions:");
    println!("{:-<60}", "");

    if regions.is_empty() {
        println!("  (no regions found)");
        return Ok(());
    }

    for region in &regions {
        println!("{} [{}]", region.sido.sido_name, region.sido.sido_code);
        let districts: Vec<String> = region
            .guguns
            .iter()
            .map(|g| format!("{} [{}]", g.gugun_name, g.gugun_code))
            .collect();
        if !districts.is_empty() {
            println!("  {}", districts.join(", "));
        }
    }
    Ok(())
}

fn print_payload(payload: &Value) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(payload).context("Failed to format response")?
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = Config::load()?;
    let client = ApiClient::from_config(&config)?;

    match cli.command {
        Commands::Login {
            email,
            password,
            token,
        } => {
            auth::login(
                &client,
                email.as_deref(),
                password.as_deref(),
                token.as_deref(),
            )
            .await?;
        }
        Commands::Logout => {
            tracing::info!("Logging out...");
            auth::logout(&client).await?;
        }
        Commands::Status => {
            auth::status(&client).await?;
        }
        Commands::Review(command) => {
            print_payload(&run_review(&client, command).await?)?;
        }
        Commands::Free(command) => {
            print_payload(&run_free(&client, command).await?)?;
        }
        Commands::Notice(command) => {
            print_payload(&run_notice(&client, command).await?)?;
        }
        Commands::Regions => {
            show_regions(&client).await?;
        }
    }

    Ok(())
}
