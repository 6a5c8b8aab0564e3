use clap::Subcommand;
use halcyon_core::{now_ms, Config, Event, ToastKind, ToastPhase, ToastQueue, ToastRequest};

#[derive(Subcommand)]
pub enum ToastAction {
    /// Feed messages through the queue in real time, printing transitions
    Preview {
        /// Messages to enqueue; defaults to a demonstration set
        messages: Vec<String>,
        /// Kind applied to every message (info, warning, error, success)
        #[arg(long, default_value = "info")]
        kind: String,
        /// Display duration override in milliseconds
        #[arg(long)]
        duration: Option<u64>,
    },
}

fn parse_kind(s: &str) -> ToastKind {
    match s {
        "warning" => ToastKind::Warning,
        "error" => ToastKind::Error,
        "success" => ToastKind::Success,
        _ => ToastKind::Info,
    }
}

fn print_event(event: &Event) {
    if let Ok(line) = serde_json::to_string(event) {
        println!("{line}");
    }
}

pub fn run(action: ToastAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ToastAction::Preview {
            messages,
            kind,
            duration,
        } => {
            let config = Config::load()?;
            let mut queue = ToastQueue::new(config.toast.clone());
            let kind = parse_kind(&kind);

            let messages = if messages.is_empty() {
                vec![
                    "Entry saved".to_string(),
                    "Your breathing session is ready whenever you are -- take it slow today"
                        .to_string(),
                ]
            } else {
                messages
            };

            for message in messages {
                let mut request = ToastRequest::new(message).with_kind(kind);
                if let Some(ms) = duration {
                    request = request.with_duration_ms(ms);
                }
                print_event(&queue.show(request, now_ms()));
            }

            while queue.phase() != ToastPhase::Idle {
                std::thread::sleep(std::time::Duration::from_millis(25));
                for event in queue.tick(now_ms()) {
                    print_event(&event);
                }
            }
            Ok(())
        }
    }
}
