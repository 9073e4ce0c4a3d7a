//! Terminal presentation for one mounted ticket.
//!
//! Redraws on every cache change and reads agent input from stdin:
//! plain text sends, `/s N` copies suggestion N into the draft, `/send`
//! sends the current draft, `/open` and `/close` toggle the suggestions
//! panel, `/quit` unmounts.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use ticket_chat::{CacheStatus, ChatError, ChatEvent, ChatSyncController, SendOutcome, SenderBy, SkipReason, ViewModel};

enum Input {
    Continue,
    Quit,
}

/// Run the interactive loop until stdin closes or the agent quits.
pub async fn run(controller: ChatSyncController) -> Result<(), ChatError> {
    let mut updates = controller.updates();
    let mut events = controller.events();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    render(controller.ticket().as_str(), &controller.view_model());

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                render(controller.ticket().as_str(), &controller.view_model());
            }
            event = events.recv() => match event {
                Ok(ChatEvent::MessageSent { .. }) => println!("✓ Message sent!"),
                Ok(ChatEvent::SendFailed { error, .. }) => println!("✗ Message not sent: {error}"),
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            },
            line = lines.next_line() => {
                let line = line.map_err(|e| ChatError::Io(format!("stdin: {e}")))?;
                let Some(line) = line else { break };
                if let Input::Quit = handle_line(&controller, line.trim()).await {
                    break;
                }
            }
        }
    }
    Ok(())
}

async fn handle_line(controller: &ChatSyncController, line: &str) -> Input {
    match line {
        "" => {}
        "/quit" => return Input::Quit,
        "/open" => controller.toggle_suggestions_panel(true),
        "/close" => controller.toggle_suggestions_panel(false),
        "/send" => send(controller).await,
        cmd if cmd.starts_with("/s ") => {
            let vm = controller.view_model();
            let picked = cmd
                .trim_start_matches("/s ")
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|idx| vm.suggestions.as_ref()?.suggests.get(idx).cloned());
            match picked {
                Some(text) => {
                    controller.select_suggestion(&text);
                    println!("draft: {text}");
                }
                None => println!("no such suggestion"),
            }
        }
        cmd if cmd.starts_with('/') => println!("commands: /s N, /send, /open, /close, /quit"),
        text => {
            controller.set_draft(text);
            send(controller).await;
        }
    }
    Input::Continue
}

async fn send(controller: &ChatSyncController) {
    // Failures are reported through the event channel.
    if let Ok(SendOutcome::Skipped(reason)) = controller.send().await {
        let why = match reason {
            SkipReason::NotReady => "chat is not loaded",
            SkipReason::EmptyDraft => "draft is empty",
            SkipReason::SendInFlight => "a message is already being sent",
        };
        println!("not sent: {why}");
    }
}

fn render(ticket: &str, vm: &ViewModel) {
    println!("\n── ticket {ticket} ──");
    match vm.status {
        CacheStatus::Loading => {
            println!("Loading...");
            return;
        }
        CacheStatus::Error => return,
        CacheStatus::Ready => {}
    }

    for message in &vm.messages {
        let who = match message.sender {
            SenderBy::Client => "client",
            SenderBy::Agent => "agent ",
        };
        println!("[{who} {}] {}", message.created_at, message.content);
    }

    if vm.suggestions_panel_open {
        if let Some(bundle) = &vm.suggestions {
            println!("Suggestions:");
            for option in &bundle.options {
                println!("  · {option}");
            }
            for (idx, suggest) in bundle.suggests.iter().enumerate() {
                println!("  {}. {suggest}", idx + 1);
            }
        }
    }

    if !vm.draft_text.is_empty() {
        println!("draft: {}", vm.draft_text);
    }
}
