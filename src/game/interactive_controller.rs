//! Interactive judge: the teacher types verdicts at the terminal
//!
//! Input and output are boxed so tests can drive the prompt with canned
//! text. End of input counts as `skip` / no card.

use crate::core::StudentItemId;
use crate::game::controller::{ItemWindow, JudgeController, SessionView};
use crate::game::phase::Judgment;
use std::io::{self, BufRead, Write};

pub struct InteractiveJudge {
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
}

impl InteractiveJudge {
    pub fn stdin() -> Self {
        InteractiveJudge {
            input: Box::new(io::BufReader::new(io::stdin())),
            output: Box::new(io::stdout()),
        }
    }

    pub fn from_io(input: impl BufRead + 'static, output: impl Write + 'static) -> Self {
        InteractiveJudge {
            input: Box::new(input),
            output: Box::new(output),
        }
    }

    /// Prompt and read one trimmed line; `None` at end of input
    fn prompt(&mut self, prompt: &str) -> Option<String> {
        let _ = write!(self.output, "{prompt} ");
        let _ = self.output.flush();
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }

    fn show_student(&mut self, view: &SessionView) {
        if let Some(student) = view.current() {
            let _ = writeln!(
                self.output,
                "\n>>> {} [{}] {} | picked {} times",
                student.name,
                student.rarity().label(),
                student,
                student.pick_count()
            );
        }
    }

    fn show_help(&mut self) {
        let _ = writeln!(self.output, "  c / correct    answer was right (+1 star, item card)");
        let _ = writeln!(self.output, "  i / incorrect  answer was wrong (-1 star, penalty card)");
        let _ = writeln!(self.output, "  s / skip       no verdict");
        let _ = writeln!(self.output, "  ?              this help");
    }
}

impl JudgeController for InteractiveJudge {
    fn name(&self) -> &str {
        "interactive"
    }

    fn judge(&mut self, view: &SessionView) -> Judgment {
        self.show_student(view);
        loop {
            let Some(line) = self.prompt("Verdict [c/i/s, ? for help]:") else {
                return Judgment::Skip;
            };
            if line == "?" {
                self.show_help();
                continue;
            }
            match line.parse::<Judgment>() {
                Ok(judgment) => return judgment,
                Err(e) => {
                    let _ = writeln!(self.output, "{e}");
                }
            }
        }
    }

    fn choose_item(&mut self, view: &SessionView, window: ItemWindow) -> Option<StudentItemId> {
        let items = view.inventory();
        if items.is_empty() {
            return None;
        }

        let when = match window {
            ItemWindow::BeforeJudgment => "before answering",
            ItemWindow::AfterJudgment => "before the turn ends",
        };
        let _ = writeln!(self.output, "Cards in hand ({when}):");
        for (index, item) in items.iter().enumerate() {
            let _ = writeln!(
                self.output,
                "  {index}) {} - {}",
                item.item_card.name, item.item_card.function_desc
            );
        }

        loop {
            let line = self.prompt("Play a card [number, Enter to pass]:")?;
            if line.is_empty() || line == "p" {
                return None;
            }
            match line.parse::<usize>() {
                Ok(index) if index < items.len() => return Some(items[index].id),
                _ => {
                    let _ = writeln!(self.output, "Enter 0-{} or press Enter", items.len() - 1);
                }
            }
        }
    }

    fn on_session_end(&mut self, view: &SessionView) {
        let stats = view.roster().coverage();
        let _ = writeln!(
            self.output,
            "Session over: {}/{} students called on ({}%)",
            stats.picked, stats.total, stats.progress
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::core::{Student, StudentId};
    use crate::game::ClassSession;
    use std::io::Cursor;

    fn session() -> ClassSession {
        let backend = MemoryBackend::with_students(1, vec![Student::new(StudentId::new(1), "Solo")]);
        ClassSession::new(backend, 1).unwrap()
    }

    #[test]
    fn test_reads_until_valid_verdict() {
        let session = session();
        let view = SessionView::new(&session);
        let mut judge = InteractiveJudge::from_io(Cursor::new("?\nmaybe\nincorrect\n"), io::sink());
        assert_eq!(judge.judge(&view), Judgment::Incorrect);
    }

    #[test]
    fn test_end_of_input_skips() {
        let session = session();
        let view = SessionView::new(&session);
        let mut judge = InteractiveJudge::from_io(Cursor::new(""), io::sink());
        assert_eq!(judge.judge(&view), Judgment::Skip);
        assert!(judge.choose_item(&view, ItemWindow::AfterJudgment).is_none());
    }
}
