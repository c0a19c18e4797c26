//! Interactive record session runner

use std::process::ExitCode;
use std::time::Duration as StdDuration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::application::ports::{NotificationIcon, Notifier};
use crate::application::{SessionConfig, SessionController, SessionError};
use crate::domain::catalog::format_clock;
use crate::domain::config::AppConfig;
use crate::domain::session::SessionStatus;
use crate::infrastructure::create_notifier;

use super::app::{Services, EXIT_ERROR, EXIT_SUCCESS};
use super::args::RecordOptions;
use super::presenter::Presenter;
use super::signals::{SessionCommand, SessionInput, SessionInputHandler};

/// Redraw period for the live line
const RENDER_INTERVAL: StdDuration = StdDuration::from_millis(100);

/// Run the interactive record session
pub async fn run_record(options: RecordOptions, config: AppConfig) -> ExitCode {
    let mut presenter = Presenter::new();
    let services = Services::new(&config);

    // Saves insert into the catalog, so it must be populated first
    if let Err(e) = services.load_catalog(false).await {
        presenter.error(&format!("Failed to load recordings: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    let session_config = SessionConfig::from_app_config(&config, options.reference.clone());
    let controller = SessionController::new(
        services.device,
        services.fs,
        services.store,
        session_config,
    );
    let notifier = create_notifier(options.notify);

    let mut inputs = match SessionInputHandler::new().await {
        Ok(handler) => handler,
        Err(e) => {
            presenter.error(&format!("Failed to setup signal handler: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    presenter.info(&format!(
        "Reading {} ({})",
        options.reference,
        controller.config().language
    ));
    presenter.session_help();

    let bars = config.display_bars_or_default();
    let ok = session_loop(&controller, &mut inputs, &mut presenter, &notifier, bars).await;
    presenter.stop_spinner();

    if ok {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}

async fn session_loop<N: Notifier>(
    controller: &SessionController,
    inputs: &mut SessionInputHandler,
    presenter: &mut Presenter,
    notifier: &N,
    bars: usize,
) -> bool {
    let progress = controller.progress();
    let mut render = interval(RENDER_INTERVAL);
    render.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            input = inputs.recv() => {
                let command = match input {
                    Some(SessionInput::Command(command)) => command,
                    Some(SessionInput::Invalid(reason)) => {
                        presenter.warn(&format!("{} (type 'help')", reason));
                        continue;
                    }
                    // Every input source is gone
                    None => return false,
                };

                if command == SessionCommand::Quit {
                    quit(controller, presenter).await;
                    return true;
                }

                if let Err(e) = execute(command, controller, presenter, notifier, bars).await {
                    presenter.error(&e.to_string());
                    if matches!(e, SessionError::Device(_) | SessionError::PermissionDenied) {
                        let _ = notifier
                            .notify("Verse Recorder", &e.to_string(), NotificationIcon::Error)
                            .await;
                    }
                }
            }
            _ = render.tick() => {
                let status = controller.status();
                if status == SessionStatus::Idle {
                    presenter.stop_spinner();
                    continue;
                }
                let levels = controller.display_levels(bars);
                let line = presenter.format_live(status, controller.elapsed_ms(), &levels, *progress.borrow());
                if presenter.is_spinning() {
                    presenter.update_spinner(&line);
                } else {
                    presenter.start_spinner(&line);
                }
            }
        }
    }
}

async fn execute<N: Notifier>(
    command: SessionCommand,
    controller: &SessionController,
    presenter: &mut Presenter,
    notifier: &N,
    bars: usize,
) -> Result<(), SessionError> {
    debug!(?command, status = %controller.status(), "session command");
    match command {
        SessionCommand::Record => {
            controller.start_recording().await?;
            let _ = notifier
                .notify(
                    "Recording",
                    &controller.config().reference.to_string(),
                    NotificationIcon::Recording,
                )
                .await;
        }
        SessionCommand::Stop => match controller.status() {
            SessionStatus::Playing | SessionStatus::Paused => controller.stop_playback().await?,
            _ => {
                controller.stop_recording().await?;
                presenter.stop_spinner();
                presenter.success(&format!(
                    "Recorded {}",
                    format_clock(controller.elapsed_ms())
                ));
                presenter.waveform(&controller.display_levels(bars));
            }
        },
        SessionCommand::Play => controller.play_recording().await?,
        SessionCommand::Pause => controller.pause_playback().await?,
        SessionCommand::Seek(secs) => {
            let target_ms = (secs.max(0.0) * 1000.0) as u64;
            let position = controller.seek(target_ms).await?;
            presenter.info(&format!("Position {}", format_clock(position)));
        }
        SessionCommand::Save => {
            if controller.status().has_playback() {
                controller.stop_playback().await?;
            }
            let saved = controller.save_recording().await?;
            let recording = saved.recording;
            presenter.stop_spinner();
            presenter.success(&format!("Saved {}", recording.file_name));
            presenter.output(&recording.file_path.to_string_lossy());
            if let Some(e) = saved.catalog_error {
                presenter.warn(&format!(
                    "Catalog cache not updated ({}); it will be rebuilt on next launch",
                    e
                ));
            }
            let _ = notifier
                .notify("Recording saved", &recording.file_name, NotificationIcon::Saved)
                .await;
        }
        SessionCommand::Cancel => {
            controller.cancel_recording().await?;
            presenter.stop_spinner();
            presenter.info("Take discarded");
        }
        SessionCommand::Status => {
            let status = controller.status();
            let take = controller
                .take_path()
                .await
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "none".to_string());
            presenter.info(&format!("Status: {} | Unsaved take: {}", status, take));
        }
        SessionCommand::Help => presenter.session_help(),
        SessionCommand::Quit => {}
    }
    Ok(())
}

/// Discard anything unsaved before leaving
async fn quit(controller: &SessionController, presenter: &mut Presenter) {
    let status = controller.status();
    if status != SessionStatus::Idle {
        if let Err(e) = controller.cancel_recording().await {
            warn!(error = %e, "failed to discard take on quit");
        }
        presenter.stop_spinner();
        presenter.warn("Unsaved take discarded");
    }
}
