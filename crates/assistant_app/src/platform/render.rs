use std::collections::HashMap;
use std::io::{self, Write};

use assistant_core::{ConversationView, TurnId, TurnKind, TurnRowView, TurnStatus};
use assistant_engine::parse_medical_summary;

#[derive(Default)]
struct ShownTurn {
    content: String,
    finished: bool,
}

/// Prints streaming turns incrementally: only the new suffix of a turn is
/// written unless its content was replaced.
pub struct TerminalRenderer<W: Write> {
    out: W,
    shown: HashMap<TurnId, ShownTurn>,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            shown: HashMap::new(),
        }
    }

    pub fn render(&mut self, view: &ConversationView) -> io::Result<()> {
        for turn in &view.turns {
            if !self.shown.contains_key(&turn.turn_id) {
                let label = match turn.kind {
                    TurnKind::Chat => "assistant",
                    TurnKind::Summary => "summary",
                };
                write!(self.out, "{label}> ")?;
                self.shown.insert(turn.turn_id, ShownTurn::default());
            }
            let Some(shown) = self.shown.get_mut(&turn.turn_id) else {
                continue;
            };
            if shown.finished {
                continue;
            }

            match turn.content.strip_prefix(shown.content.as_str()) {
                Some(suffix) => write!(self.out, "{suffix}")?,
                None => write!(self.out, "\n{}", turn.content)?,
            }
            shown.content.clone_from(&turn.content);

            match &turn.status {
                TurnStatus::Streaming => {}
                TurnStatus::Completed => {
                    shown.finished = true;
                    writeln!(self.out)?;
                    if turn.kind == TurnKind::Summary {
                        write_summary(&mut self.out, turn)?;
                    }
                }
                TurnStatus::Failed { message } => {
                    shown.finished = true;
                    writeln!(self.out, "\n[error] {message}")?;
                }
            }
        }
        self.out.flush()
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

fn write_summary(out: &mut impl Write, turn: &TurnRowView) -> io::Result<()> {
    let Some(summary) = parse_medical_summary(&turn.content) else {
        return Ok(());
    };
    for (name, value) in summary.or_placeholder().fields() {
        writeln!(out, "  {name}: {value}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assistant_core::{update, Conversation, Msg};

    use super::TerminalRenderer;

    fn render_all(msgs: Vec<Msg>) -> String {
        let mut state = Conversation::new("p");
        let mut renderer = TerminalRenderer::new(Vec::new());
        for msg in msgs {
            let (next, _) = update(state, msg);
            state = next;
            renderer.render(&state.view()).unwrap();
        }
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn streams_suffixes_only() {
        let output = render_all(vec![
            Msg::InputChanged("hi".to_string()),
            Msg::PromptSubmitted,
            Msg::FragmentAppended {
                turn_id: 1,
                text: "Hel".to_string(),
            },
            Msg::FragmentAppended {
                turn_id: 1,
                text: "lo".to_string(),
            },
            Msg::TurnCompleted { turn_id: 1 },
            Msg::Tick,
        ]);
        assert_eq!(output, "assistant> Hello\n");
    }

    #[test]
    fn failure_is_reported_after_partial_text() {
        let output = render_all(vec![
            Msg::InputChanged("hi".to_string()),
            Msg::PromptSubmitted,
            Msg::FragmentAppended {
                turn_id: 1,
                text: "Part".to_string(),
            },
            Msg::TurnFailed {
                turn_id: 1,
                message: "network error".to_string(),
            },
        ]);
        assert_eq!(output, "assistant> Part\n[error] network error\n");
    }

    #[test]
    fn completed_summary_prints_fields() {
        let content = r#"{"properties":{"vital_signs":{"description":"BP 120/80"}}}"#;
        let output = render_all(vec![
            Msg::SummaryRequested {
                visit_id: "v".to_string(),
                doctor_id: "d".to_string(),
                patient_id: "p".to_string(),
            },
            Msg::FragmentAppended {
                turn_id: 1,
                text: content.to_string(),
            },
            Msg::TurnCompleted { turn_id: 1 },
        ]);
        assert!(output.contains("  vital_signs: BP 120/80\n"));
        assert!(output.contains("  current_medications: No record\n"));
    }
}
