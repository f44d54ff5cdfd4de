use chd_study_lib::bank::{Question, QuestionType};
use chd_study_lib::review::ReviewCard;

/// ANSI color codes
pub struct Color;

impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";
}

/// Wrap `text` in a color when colors are enabled
pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

/// Horizontal rule
pub fn rule(width: usize) -> String {
    "\u{2500}".repeat(width)
}

pub fn percent(fraction: f64) -> String {
    format!("{:.0}%", fraction * 100.0)
}

/// Render a question. With `reveal`, correct options are marked and the
/// rationale follows.
pub fn render_question(question: &Question, reveal: bool, use_color: bool) -> String {
    let mut lines = Vec::new();

    lines.push(paint(
        &format!(
            "[{}] {} \u{00b7} {} \u{00b7} {}",
            question.id,
            question.lesion_group,
            question.category.label(),
            question.difficulty
        ),
        Color::GRAY,
        use_color,
    ));
    lines.extend(wrap_lines(&question.prompt, "", 80));
    if question.question_type == QuestionType::Multi {
        lines.push(paint("(select all that apply)", Color::DIM, use_color));
    }
    lines.push(String::new());

    for option in &question.options {
        let line = format!("  {}. {}", option.key, option.text);
        if reveal && option.correct {
            lines.push(paint(&format!("{}  \u{2713}", line), Color::GREEN, use_color));
        } else {
            lines.push(line);
        }
    }

    if reveal {
        lines.push(String::new());
        lines.extend(wrap_lines(&question.rationale, "", 80));
    }

    lines.join("\n")
}

/// Render a review card (never shows which option is correct)
pub fn render_card(card: &ReviewCard, use_color: bool) -> String {
    let mut lines = Vec::new();

    let status = if card.due_now { "due" } else { "early" };
    lines.push(paint(
        &format!(
            "[{}] {} \u{00b7} {} \u{00b7} {}",
            card.question_id,
            card.lesion_group,
            card.category.label(),
            status
        ),
        Color::GRAY,
        use_color,
    ));
    lines.extend(wrap_lines(&card.prompt, "", 80));
    lines.push(String::new());
    for option in &card.options {
        lines.push(format!("  {}. {}", option.key, option.text));
    }

    lines.join("\n")
}

/// Simple word-wrapping for terminal output
pub fn wrap_lines(text: &str, prefix: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let effective_width = max_width.saturating_sub(prefix.len());

    for line in text.lines() {
        if line.len() <= effective_width {
            lines.push(format!("{}{}", prefix, line));
            continue;
        }

        let mut current_line = String::new();
        for word in line.split_whitespace() {
            if current_line.is_empty() {
                current_line = word.to_string();
            } else if current_line.len() + 1 + word.len() <= effective_width {
                current_line.push(' ');
                current_line.push_str(word);
            } else {
                lines.push(format!("{}{}", prefix, current_line));
                current_line = word.to_string();
            }
        }
        if !current_line.is_empty() {
            lines.push(format!("{}{}", prefix, current_line));
        }
    }

    lines
}
