use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use article_cache::{
    api::MockArticleApi,
    config::{load_fixtures, CacheConfig},
    ArticleCache, Predicate,
};

#[derive(Parser)]
#[command(name = "article-cache")]
#[command(about = "Browse a fixture article set through the partitioned cache")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// JSON file with an article array or an `{"articles": [...]}` response
    #[arg(long)]
    fixtures: PathBuf,

    /// Username the fixture server answers for
    #[arg(long, default_value = "reader")]
    viewer: String,

    /// Show the viewer's personal feed
    #[arg(long)]
    feed: bool,

    /// Authors the viewer follows, for `--feed`
    #[arg(long = "follow")]
    follows: Vec<String>,

    #[arg(long)]
    favorited_by: Option<String>,

    #[arg(long)]
    tag: Option<String>,

    #[arg(long)]
    author: Option<String>,

    #[arg(long, default_value = "0")]
    page: u32,

    /// Favorite this article after loading
    #[arg(long)]
    favorite: Option<String>,

    #[arg(long, default_value = "false")]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("article_cache={filter_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let config = CacheConfig::from_env().context("Failed to load cache configuration")?;
    let articles = load_fixtures(&args.fixtures)?;
    info!("Loaded {} fixture articles", articles.len());

    let api = Arc::new(MockArticleApi::new(args.viewer.clone()).with_articles(articles));
    for author in &args.follows {
        api.follow(author.clone());
    }

    let cache = ArticleCache::new(api, config);
    cache.set_predicate(Predicate {
        my_feed: args.feed,
        favorited_by: args.favorited_by,
        tag: args.tag,
        author: args.author,
    });
    if args.page > 0 {
        cache.set_page(args.page);
    }

    cache.ensure_loaded().await.context("Failed to load articles")?;

    if let Some(slug) = &args.favorite {
        if let Err(e) = cache.favorite(slug).await {
            warn!("Could not favorite '{}': {}", slug, e);
        }
    }

    let output = json!({
        "context": cache.context().to_string(),
        "page": cache.page(),
        "totalPages": cache.total_pages(),
        "articles": cache.articles().collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
