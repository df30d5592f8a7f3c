use std::env;
use std::sync::Arc;

use ::serenity::all::ClientBuilder;
use dotenv::dotenv;
use poise::serenity_prelude as serenity;
use songbird::SerenityInit;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use turntable::commands::general::ping;
use turntable::commands::music::{
    pause, play, queue, resume, skip, spawn_notice_forwarder, stop,
};
use turntable::playback::{
    MusicError, PlaybackController, ResolverConfig, SessionFactory, SongbirdSession, VoiceSession,
    YtDlpResolver,
};
use turntable::{CommandResult, Context, Data, Error};

#[poise::command(slash_command, category = "General")]
async fn help(
    ctx: Context<'_>,
    #[description = "Specific command to show help about"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> CommandResult {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            show_context_menu_commands: true,
            ..Default::default()
        },
    )
    .await
    .map_err(|e| e.into())
}

#[poise::command(prefix_command, hide_in_help)]
async fn register(ctx: Context<'_>) -> Result<(), Error> {
    poise::builtins::register_application_commands_buttons(ctx)
        .await
        .map_err(|e| e.into())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize logging with debug level for our crate
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("turntable=debug,warn")),
        )
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_target(true)
        .with_ansi(true)
        .pretty()
        .init();

    dotenv().ok();

    let token = env::var("DISCORD_TOKEN").expect("Missing DISCORD_TOKEN");

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_VOICE_STATES;

    let commands = vec![
        // Default commands
        register(),
        help(),
        // General commands
        ping(),
        // Music commands
        play(),
        pause(),
        resume(),
        skip(),
        stop(),
        queue(),
    ];

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands,
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                let manager = songbird::get(ctx).await.ok_or(MusicError::NoVoiceManager)?;
                let http_client = reqwest::Client::new();
                let sessions: SessionFactory = Box::new(move |guild_id| {
                    Arc::new(SongbirdSession::new(
                        manager.clone(),
                        guild_id,
                        http_client.clone(),
                    )) as Arc<dyn VoiceSession>
                });

                let resolver = Arc::new(YtDlpResolver::new(ResolverConfig::default()));
                let (controller, notices) = PlaybackController::new(sessions, resolver);
                spawn_notice_forwarder(ctx.http.clone(), notices);

                Ok(Data { controller })
            })
        });

    let mut client = ClientBuilder::new(token, intents)
        .framework(framework.build())
        .register_songbird()
        .await?;

    let shard_manager = client.shard_manager.clone();

    tokio::select! {
        result = client.start() => result.map_err(Into::into),
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl-C, shutting down");
            shard_manager.shutdown_all().await;
            Ok(())
        }
    }
}
