//! The terminal event loop.
//!
//! Stdin is read on its own thread and forwarded line by line, so the loop
//! only ever awaits two channels: input lines and timer ticks. Both are
//! handled on this task, one at a time, through `&mut SessionMachine`.

use std::io::BufRead;

use tokio::sync::mpsc;

use dailytest_core::error::SessionError;
use dailytest_core::session::{Screen, SessionMachine, TickOutcome, UNAVAILABLE_MESSAGE};
use dailytest_core::timer::{format_clock, TimerId};

use crate::render;

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Start,
    /// Zero-based option index.
    Select(usize),
    Next,
    Prev,
    Skip,
    /// Zero-based question index.
    GoTo(usize),
    Review,
    Back,
    Submit,
    Yes,
    No,
    Explain,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub fn parse_input(line: &str) -> Input {
    let line = line.trim().to_lowercase();
    let mut words = line.split_whitespace();
    let (first, second, rest) = (words.next(), words.next(), words.next());

    match (first, second, rest) {
        (None, _, _) => Input::Empty,
        (Some("go"), Some(n), None) => match n.parse::<usize>() {
            Ok(n) if n > 0 => Input::GoTo(n - 1),
            _ => Input::Unknown(line.clone()),
        },
        (Some(word), None, _) => match word {
            "start" => Input::Start,
            "next" => Input::Next,
            "prev" | "previous" => Input::Prev,
            "skip" => Input::Skip,
            "review" => Input::Review,
            "back" => Input::Back,
            "submit" => Input::Submit,
            "yes" => Input::Yes,
            "no" => Input::No,
            "explain" => Input::Explain,
            "help" | "?" => Input::Help,
            "quit" | "exit" => Input::Quit,
            letter => {
                let mut chars = letter.chars();
                match (chars.next(), chars.next()) {
                    (Some(c @ 'a'..='z'), None) => Input::Select((c as u8 - b'a') as usize),
                    _ => Input::Unknown(line.clone()),
                }
            }
        },
        _ => Input::Unknown(line.clone()),
    }
}

fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Show whatever screen loading landed on, then drive the session until it
/// closes.
pub async fn present(
    machine: &mut SessionMachine,
    ticks: mpsc::UnboundedReceiver<TimerId>,
) {
    if machine.screen() == Screen::Unavailable {
        println!("{UNAVAILABLE_MESSAGE}");
        if let Some(reason) = machine.unavailable_reason() {
            tracing::info!(reason, "test unavailable");
        }
        if let Err(e) = machine.close_after_grace().await {
            tracing::warn!("{e}");
        }
        return;
    }

    if let Some(test) = machine.test() {
        render::info(test);
    }
    println!("\nType `start` to begin or `help` for commands.");
    run(machine, ticks).await;
}

async fn run(
    machine: &mut SessionMachine,
    mut ticks: mpsc::UnboundedReceiver<TimerId>,
) {
    let mut lines = spawn_stdin_reader();

    while !machine.is_closed() {
        tokio::select! {
            Some(id) = ticks.recv() => on_tick(machine, id),
            line = lines.recv() => match line {
                Some(line) => handle(machine, parse_input(&line)),
                None => {
                    tracing::debug!(session = %machine.id(), "end of input");
                    machine.close();
                }
            },
        }
    }
}

fn on_tick(machine: &mut SessionMachine, id: TimerId) {
    let low_time_secs = machine.config().low_time_secs;
    match machine.on_timer(id) {
        TickOutcome::Remaining(secs) => {
            if secs % 60 == 0 || secs == low_time_secs || secs <= 10 {
                println!("⏱ {} remaining", format_clock(secs));
            }
        }
        TickOutcome::Expired => {
            if let Some(result) = machine.result() {
                render::result(result);
            }
        }
        TickOutcome::Ignored => {}
    }
}

fn show_current(machine: &SessionMachine) {
    if let Some(view) = machine.current_question() {
        render::question(&view);
    }
}

pub fn handle(machine: &mut SessionMachine, input: Input) {
    let outcome = match input {
        Input::Help => {
            render::help();
            Ok(())
        }
        Input::Quit => {
            machine.close();
            Ok(())
        }
        Input::Empty => {
            show_current(machine);
            Ok(())
        }
        Input::Start => machine.start().map(|_| show_current(machine)),
        Input::Select(option) => match machine.select_answer(option) {
            Err(SessionError::OptionOutOfRange { .. }) => {
                if let Some(view) = machine.current_question() {
                    println!("Choose one of {}.", render::option_range(view.question));
                }
                Ok(())
            }
            other => other.map(|_| show_current(machine)),
        },
        Input::Next | Input::Skip => machine.next().map(|moved| {
            if moved {
                show_current(machine);
            } else {
                println!("This is the last question. Type `submit` when you are done.");
            }
        }),
        Input::Prev => machine.previous().map(|moved| {
            if moved {
                show_current(machine);
            } else {
                println!("This is the first question.");
            }
        }),
        Input::GoTo(index) => machine.go_to(index).map(|_| show_current(machine)),
        Input::Review => machine.show_review().map(|summary| render::review(&summary)),
        Input::Back => machine.back_to_test().map(|_| show_current(machine)),
        Input::Submit => machine.request_submit().map(|confirmation| {
            println!("{} Submit now? (yes/no)", confirmation.message());
        }),
        Input::Yes if machine.confirmation().is_none() => {
            println!("Type `submit` first.");
            Ok(())
        }
        Input::Yes => machine.confirm_submit().map(render::result),
        Input::No => machine.cancel_submit().map(|_| {
            println!("Submission cancelled.");
            show_current(machine);
        }),
        Input::Explain => machine.view_explanations().map(|sent| {
            if sent {
                println!("Explanations requested.");
            } else {
                println!("Explanations are sent by the bot; run with --embedded inside the chat app.");
            }
        }),
        Input::Unknown(text) => {
            println!("Unknown command `{text}`. Type `help` for commands.");
            Ok(())
        }
    };

    if let Err(e) = outcome {
        println!("Not now: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dailytest_core::host::Host;
    use dailytest_core::timer::ManualTickSource;
    use dailytest_repository::StaticRepository;

    #[test]
    fn parses_letters_and_words() {
        assert_eq!(parse_input("a"), Input::Select(0));
        assert_eq!(parse_input(" D "), Input::Select(3));
        assert_eq!(parse_input("b"), Input::Select(1));
        assert_eq!(parse_input("back"), Input::Back);
        assert_eq!(parse_input("go 5"), Input::GoTo(4));
        assert_eq!(parse_input("go 0"), Input::Unknown("go 0".into()));
        assert_eq!(parse_input("Submit"), Input::Submit);
        assert_eq!(parse_input(""), Input::Empty);
        assert_eq!(parse_input("ab"), Input::Unknown("ab".into()));
        assert_eq!(parse_input("1"), Input::Unknown("1".into()));
    }

    fn sample_machine() -> SessionMachine {
        let repo = StaticRepository::sample().unwrap();
        let test = repo.tests().next().unwrap().clone();
        let mut machine = SessionMachine::new(Host::default(), Box::new(ManualTickSource::new()));
        machine.load_test(test).unwrap();
        machine
    }

    #[test]
    fn full_attempt_through_inputs() {
        let mut machine = sample_machine();
        for line in ["start", "b", "go 2", "a", "review", "back", "submit", "yes"] {
            handle(&mut machine, parse_input(line));
        }

        assert_eq!(machine.screen(), Screen::Completed);
        let result = machine.result().unwrap();
        assert_eq!(result.correct, 1);
        assert_eq!(result.wrong, 1);
        assert_eq!(result.skipped, 18);
    }

    #[test]
    fn yes_without_submit_is_ignored() {
        let mut machine = sample_machine();
        handle(&mut machine, Input::Start);
        handle(&mut machine, Input::Yes);
        assert_eq!(machine.screen(), Screen::InProgress);

        handle(&mut machine, Input::Submit);
        handle(&mut machine, Input::No);
        handle(&mut machine, Input::Yes);
        assert_eq!(machine.screen(), Screen::InProgress);
    }

    #[test]
    fn quit_closes_without_submitting() {
        let mut machine = sample_machine();
        handle(&mut machine, Input::Start);
        handle(&mut machine, Input::Quit);
        assert!(machine.is_closed());
        assert!(machine.result().is_none());
        assert!(!machine.timer_running());
    }
}
