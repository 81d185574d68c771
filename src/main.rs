use std::{path::Path, process::ExitCode, sync::Arc};

use clap::Parser;
use folio::{
    application::{
        error::AppError,
        pagination::{PageRequest, PostCursor},
        posts::{CreatePostCommand, PostService, PostSummary},
    },
    config::{self, CliArgs, Command, PostContentArgs},
    domain::posts::PostDraft,
    infra::{error::InfraError, store::PostgresStore, telemetry},
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report_application_error(&error);
            error.exit_code()
        }
    }
}

fn report_application_error(error: &AppError) {
    let report = error.report();
    let log = || {
        error!(
            target = "folio::main",
            error = %report.chain(),
            "{}",
            error.presentation_message()
        );
    };

    if dispatcher::has_been_set() {
        log();
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, log);
}

async fn run() -> Result<(), AppError> {
    let cli_args = CliArgs::parse();
    let settings = config::load(&cli_args)?;

    telemetry::init(&settings.logging)?;

    let store = connect_store(&settings).await?;
    if matches!(cli_args.command, Command::Migrate(_)) {
        info!(target = "folio::main", "migrations applied");
        return Ok(());
    }

    let posts = PostService::with_store(Arc::new(store));

    match cli_args.command {
        Command::Migrate(_) => Ok(()),
        Command::Create(args) => {
            let draft = read_draft(&args.content).await?;
            let meta = posts
                .create_post(CreatePostCommand {
                    slug: args.slug,
                    draft,
                })
                .await?;
            println!("{}", meta.slug);
            Ok(())
        }
        Command::Edit(args) => {
            let draft = read_draft(&args.content).await?;
            let meta = posts.edit_post(&args.slug, draft).await?;
            println!("{}\t{}", meta.slug, status_label(meta.is_public, meta.is_published));
            Ok(())
        }
        Command::Publish(args) => {
            let meta = posts.set_visibility(&args.slug, true).await?;
            println!("{}\t{}", meta.slug, status_label(meta.is_public, meta.is_published));
            Ok(())
        }
        Command::Hide(args) => {
            let meta = posts.set_visibility(&args.slug, false).await?;
            println!("{}\t{}", meta.slug, status_label(meta.is_public, meta.is_published));
            Ok(())
        }
        Command::Delete(args) => {
            posts.delete_post(&args.slug).await?;
            println!("deleted {}", args.slug);
            Ok(())
        }
        Command::List(args) => {
            let cursor = args
                .cursor
                .as_deref()
                .map(PostCursor::decode)
                .transpose()
                .map_err(folio::application::posts::PostError::from)?;
            let size = settings.listing.batch_size(cursor.is_some());
            let page = posts.list_posts(PageRequest::new(size, cursor)).await?;

            for summary in &page.items {
                println!("{}", summary_line(summary));
            }
            if let Some(next) = page.next_cursor.as_ref() {
                println!("next: {}", next.encode());
            }
            Ok(())
        }
        Command::Stats(_) => {
            let total = posts.total_reads().await?;
            println!("total reads: {total}");
            Ok(())
        }
    }
}

async fn connect_store(settings: &config::Settings) -> Result<PostgresStore, AppError> {
    let database_url = settings
        .database
        .url
        .as_deref()
        .ok_or_else(|| {
            InfraError::configuration(
                "database url is not configured (provide --database-url or set FOLIO__DATABASE__URL)",
            )
        })?;

    let pool =
        PostgresStore::connect(database_url, settings.database.max_connections.get())
            .await
            .map_err(InfraError::from)?;
    PostgresStore::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;

    Ok(PostgresStore::new(pool))
}

async fn read_draft(content: &PostContentArgs) -> Result<PostDraft, AppError> {
    let mdx_source = read_source(&content.source_file).await?;
    Ok(PostDraft {
        title: content.title.clone(),
        author: content.author.clone(),
        featured_image: content.featured_image.clone(),
        mdx_source,
        requested_public: content.public,
    })
}

async fn read_source(path: &Path) -> Result<String, AppError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))
}

fn status_label(is_public: bool, is_published: bool) -> &'static str {
    match (is_public, is_published) {
        (true, _) => "public",
        (false, true) => "hidden",
        (false, false) => "draft",
    }
}

fn summary_line(summary: &PostSummary) -> String {
    let meta = &summary.meta;
    let reads = summary
        .read_count
        .map(|count| count.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{}\t{}\t{}\t{}",
        meta.slug,
        status_label(meta.is_public, meta.is_published),
        reads,
        meta.title
    )
}
