mod app;
mod cache;
mod commands;
mod config;
mod content;
mod error;
mod logging;
mod query;

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;

use app::BlogView;
use config::RenderContext;
use content::cache::ResourceKind;
use content::filter::{BlogFilters, BlogSortField, SortOrder};
use content::types::{BlogCategory, ContactForm};
use query::FetchOptions;

#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(about = "Browse a portfolio and blog site's content from the terminal")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./folio.yaml, then $XDG_CONFIG_HOME/folio/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Content API base URL
  #[arg(long)]
  api_url: Option<String>,

  /// Render context the client acts in
  #[arg(long, value_enum)]
  render_context: Option<RenderContext>,

  /// Bypass cached data
  #[arg(short, long)]
  refresh: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Render a site page (home, about-me, experience, ...)
  Page {
    /// Page name, alias, or prefix
    name: String,
  },
  /// List blog posts
  Blogs {
    /// TECHNICAL, LIFE or CAREER
    #[arg(long)]
    category: Option<BlogCategory>,
    /// Text to find in title, excerpt or content
    #[arg(short, long)]
    search: Option<String>,
    /// publishedAt, viewCount or readingTime
    #[arg(long)]
    sort_by: Option<BlogSortField>,
    /// asc or desc
    #[arg(long)]
    order: Option<SortOrder>,
  },
  /// Show one blog post
  Blog { slug: String },
  /// Send a message through the contact form
  Contact {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    subject: Option<String>,
    #[arg(long)]
    message: String,
  },
  /// Show the state of every resource cache
  Status {
    /// Mark these resources stale before fetching (blogs, skills, ...)
    #[arg(long, value_delimiter = ',')]
    invalidate: Vec<ResourceKind>,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(url) = args.api_url {
    config.api.url = url;
  }
  if let Some(context) = args.render_context {
    config.render_context = context;
  }

  let _log_guard = logging::init(&config.logging, config.debug)?;

  let app = app::App::new(config)?;

  match args.command {
    Command::Page { name } => {
      let page = commands::resolve(&name).ok_or_else(|| {
        let pages: Vec<String> = commands::PAGES
          .iter()
          .map(|p| format!("  {:<15} {}", p.name, p.description))
          .collect();
        eyre!("Unknown page '{}'. Pages:\n{}", name, pages.join("\n"))
      })?;
      print!("{}", app.show_page(page, args.refresh).await);
    }
    Command::Blogs {
      category,
      search,
      sort_by,
      order,
    } => {
      let filters = BlogFilters {
        category,
        search,
        sort_by,
        sort_order: order,
      };
      print!("{}", app.list_blogs(&filters, args.refresh).await);
    }
    Command::Blog { slug } => match app.open_blog(&slug).await {
      BlogView::Found(text) => print!("{}", text),
      BlogView::Redirect(text) => {
        print!("{}", text);
        print!("{}", app.list_blogs(&BlogFilters::default(), false).await);
      }
      BlogView::Unavailable(text) => return Err(eyre!("{}", text.trim_end())),
    },
    Command::Contact {
      name,
      email,
      subject,
      message,
    } => {
      let form = ContactForm {
        name,
        email,
        subject,
        message,
      };
      println!("{}", app.send_contact(&form).await?);
    }
    Command::Status { invalidate } => {
      for kind in invalidate {
        app.store().invalidate(kind);
      }
      let options = if args.refresh {
        FetchOptions::refresh()
      } else {
        FetchOptions::default()
      };
      app.store().fetch_many(&ResourceKind::ALL, options).await;
      print!("{}", app.status_report());
    }
  }

  Ok(())
}
