//! Terminal stand-in for a chat transport.
//!
//! Lines typed at the prompt become chat events; inline keyboards become a
//! selection prompt. `/location LAT,LON` shares a location and `/quit` leaves.

use anyhow::Context;
use inquire::{InquireError, Select, Text};
use std::collections::VecDeque;
use weatherbot_core::{
    EventKind, InboundEvent, InteractionRouter, Keyboard, Locator, OutboundMessage, UserId,
};

#[derive(Debug, PartialEq)]
enum Line {
    Quit,
    Event(EventKind),
    Invalid(&'static str),
}

fn parse_line(line: &str) -> Line {
    let trimmed = line.trim();

    if trimmed == "/quit" {
        return Line::Quit;
    }

    if let Some(rest) = trimmed.strip_prefix("/location") {
        let coords = rest
            .split_once(',')
            .and_then(|(lat, lon)| Some((lat.trim().parse().ok()?, lon.trim().parse().ok()?)));

        return match coords {
            Some((lat, lon)) => Line::Event(EventKind::LocationInput(Locator::Coordinates { lat, lon })),
            None => Line::Invalid("usage: /location LAT,LON"),
        };
    }

    Line::Event(EventKind::from_text(line))
}

/// Reduce chat HTML to terminal text.
fn strip_html(text: &str) -> String {
    text.replace("<b>", "")
        .replace("</b>", "")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

pub async fn run(router: &InteractionRouter, user: UserId) -> anyhow::Result<()> {
    println!("Type /start to begin, /location LAT,LON to share a location, /quit to leave.");

    let mut pending: VecDeque<EventKind> = VecDeque::new();

    loop {
        let kind = match pending.pop_front() {
            Some(kind) => kind,
            None => {
                let line = match Text::new(">").prompt() {
                    Ok(line) => line,
                    Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
                    Err(err) => return Err(err).context("Failed to read chat input"),
                };

                match parse_line(&line) {
                    Line::Quit => break,
                    Line::Invalid(usage) => {
                        println!("{usage}");
                        continue;
                    }
                    Line::Event(kind) => kind,
                }
            }
        };

        let replies = router.handle(InboundEvent { user, kind }).await;
        for reply in replies {
            if let Some(next) = deliver(reply)? {
                pending.push_back(next);
            }
        }
    }

    Ok(())
}

/// Print one message; an inline keyboard turns into a choice whose answer is
/// returned as the next event.
fn deliver(message: OutboundMessage) -> anyhow::Result<Option<EventKind>> {
    println!("{}\n", strip_html(&message.text));

    match message.keyboard {
        Some(Keyboard::Inline(buttons)) => {
            let labels: Vec<&str> = buttons.iter().map(|b| b.label).collect();
            let choice = match Select::new("Choose:", labels).prompt_skippable() {
                Ok(choice) => choice,
                Err(InquireError::OperationInterrupted) => None,
                Err(err) => return Err(err).context("Failed to read selection"),
            };

            Ok(choice
                .and_then(|label| buttons.iter().find(|b| b.label == label))
                .map(|b| EventKind::from_button(b.data)))
        }
        Some(Keyboard::RequestLocation { label }) => {
            println!("[{label}] -> /location LAT,LON\n");
            Ok(None)
        }
        None => Ok(None),
    }
}
