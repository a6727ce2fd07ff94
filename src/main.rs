use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ptool::app::AppContext;
use ptool::cli::commands::{self, TorrentAction, TrackerAction};
use ptool::cli::{split_list, Cli, Commands};
use ptool::client::{AddTorrentOptions, TorrentFilter};

fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level(cli.verbose)));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = AppContext::new(cli.config)?;

    match cli.command {
        Commands::Sites => commands::list_sites(&ctx),
        Commands::Clients => commands::list_clients(&ctx),
        Commands::Latest {
            site,
            url,
            since,
            json,
        } => {
            let site = ctx.create_site(&site)?;
            commands::latest(site.as_ref(), url.as_deref(), since.as_deref(), json).await?;
        }
        Commands::Dltorrent { site, url, output } => {
            let site = ctx.create_site(&site)?;
            commands::download_torrent(site.as_ref(), &url, output).await?;
        }
        Commands::Show {
            client,
            filter,
            category,
            tag,
            json,
            torrents,
        } => {
            let client = ctx.create_client(&client)?;
            let filter = TorrentFilter::new(category, tag, filter);
            commands::show(client.as_ref(), &filter, &torrents, json).await?;
        }
        Commands::Add {
            client,
            sources,
            site,
            category,
            tags,
            save_path,
            paused,
        } => {
            let client = ctx.create_client(&client)?;
            let site = site.map(|name| ctx.create_site(&name)).transpose()?;
            let options = AddTorrentOptions {
                category,
                tags: tags.as_deref().map(split_list).unwrap_or_default(),
                save_path,
                paused,
            };
            commands::add(client.as_ref(), site.as_deref(), &sources, &options).await?;
        }
        Commands::Delete {
            client,
            delete_files,
            select,
        } => {
            let client = ctx.create_client(&client)?;
            let action = TorrentAction::Delete { delete_files };
            commands::apply_action(client.as_ref(), &select, &action).await?;
        }
        Commands::Pause { client, select } => {
            let client = ctx.create_client(&client)?;
            commands::apply_action(client.as_ref(), &select, &TorrentAction::Pause).await?;
        }
        Commands::Resume { client, select } => {
            let client = ctx.create_client(&client)?;
            commands::apply_action(client.as_ref(), &select, &TorrentAction::Resume).await?;
        }
        Commands::Recheck { client, select } => {
            let client = ctx.create_client(&client)?;
            commands::apply_action(client.as_ref(), &select, &TorrentAction::Recheck).await?;
        }
        Commands::Reannounce { client, select } => {
            let client = ctx.create_client(&client)?;
            commands::apply_action(client.as_ref(), &select, &TorrentAction::Reannounce).await?;
        }
        Commands::Addtags {
            client,
            tags,
            select,
        } => {
            let client = ctx.create_client(&client)?;
            let action = TorrentAction::AddTags(split_list(&tags));
            commands::apply_action(client.as_ref(), &select, &action).await?;
        }
        Commands::Removetags {
            client,
            tags,
            select,
        } => {
            let client = ctx.create_client(&client)?;
            let action = TorrentAction::RemoveTags(split_list(&tags));
            commands::apply_action(client.as_ref(), &select, &action).await?;
        }
        Commands::Setcategory {
            client,
            new_category,
            select,
        } => {
            let client = ctx.create_client(&client)?;
            let action = TorrentAction::SetCategory(new_category);
            commands::apply_action(client.as_ref(), &select, &action).await?;
        }
        Commands::Setsavepath {
            client,
            save_path,
            select,
        } => {
            let client = ctx.create_client(&client)?;
            let action = TorrentAction::SetSavePath(save_path);
            commands::apply_action(client.as_ref(), &select, &action).await?;
        }
        Commands::Gettags { client } => {
            let client = ctx.create_client(&client)?;
            commands::get_tags(client.as_ref()).await?;
        }
        Commands::Getcategories { client } => {
            let client = ctx.create_client(&client)?;
            commands::get_categories(client.as_ref()).await?;
        }
        Commands::Createtags { client, tags } => {
            let client = ctx.create_client(&client)?;
            client.create_tags(&split_list(&tags)).await?;
        }
        Commands::Deletetags { client, tags } => {
            let client = ctx.create_client(&client)?;
            client.delete_tags(&split_list(&tags)).await?;
        }
        Commands::Edittracker {
            client,
            old_tracker,
            new_tracker,
            replace_host,
            select,
        } => {
            let client = ctx.create_client(&client)?;
            let action = TrackerAction::Edit {
                old_tracker,
                new_tracker,
                replace_host,
            };
            commands::apply_tracker_action(client.as_ref(), &select, &action).await?;
        }
        Commands::Addtrackers {
            client,
            trackers,
            select,
        } => {
            let client = ctx.create_client(&client)?;
            let action = TrackerAction::Add(trackers);
            commands::apply_tracker_action(client.as_ref(), &select, &action).await?;
        }
        Commands::Removetrackers {
            client,
            trackers,
            select,
        } => {
            let client = ctx.create_client(&client)?;
            let action = TrackerAction::Remove(trackers);
            commands::apply_tracker_action(client.as_ref(), &select, &action).await?;
        }
    }

    Ok(())
}
