use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use assistant_core::{update, Conversation, Msg};
use assistant_logging::assistant_info;
use log::LevelFilter;

use super::config::{load_config, DEFAULT_CONFIG_FILENAME};
use super::effects::EffectRunner;
use super::input::{parse_command, Command};
use super::render::TerminalRenderer;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

pub fn run_app() -> anyhow::Result<()> {
    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILENAME));
    let mut config = load_config(&config_path)?;
    config.apply_env_overrides(|key| std::env::var(key).ok());

    let level = if config.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    assistant_logging::initialize(config.log_destination(), level, &config.log_path);
    assistant_info!("Streaming from {} as user {}", config.base_url, config.user_id);

    let runner = EffectRunner::new(config.stream_settings());
    let commands = spawn_stdin_reader();
    let mut renderer = TerminalRenderer::new(io::stdout());
    let mut state = Conversation::new(config.user_id.clone());
    let mut quitting = false;

    println!("Ask a question, or use /summary <visit_id> <doctor_id> <patient_id>, /cancel, /quit.");
    loop {
        for msg in runner.poll(POLL_INTERVAL) {
            state = dispatch(state, msg, &runner, &mut renderer)?;
        }

        loop {
            match commands.try_recv() {
                Ok(Command::Invalid(reason)) => eprintln!("{reason}"),
                Ok(command) => {
                    quitting |= command == Command::Quit;
                    for msg in command.into_msgs() {
                        state = dispatch(state, msg, &runner, &mut renderer)?;
                    }
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    quitting = true;
                    break;
                }
            }
        }

        if quitting && !state.is_streaming() {
            break;
        }
    }

    io::stdout().flush()?;
    assistant_info!("Exiting after {} turns", state.turns().len());
    Ok(())
}

fn dispatch(
    state: Conversation,
    msg: Msg,
    runner: &EffectRunner,
    renderer: &mut TerminalRenderer<io::Stdout>,
) -> io::Result<Conversation> {
    let (mut state, effects) = update(state, msg);
    runner.run(effects);
    if state.consume_dirty() {
        renderer.render(&state.view())?;
    }
    Ok(state)
}

fn spawn_stdin_reader() -> mpsc::Receiver<Command> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(parse_command(&line)).is_err() {
                break;
            }
        }
    });
    rx
}
