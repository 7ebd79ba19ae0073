//! ASCII rendering of battle views.
//!
//! Each cell is six characters wide. Team 1 units are drawn as `[Name]`,
//! team 2 units as `<Name>`, both cut to four characters. Empty cells show
//! `.`, or `*` / `+` when they are move or attack-range highlights.

use std::fmt::Write as _;
use std::io::Write;

use arena_core::grid::{Position, Team};
use arena_core::view::{BattleView, Renderer, UnitView};

/// ASCII rendering configuration.
#[derive(Debug, Clone)]
pub struct AsciiConfig {
    /// Use colored output (ANSI).
    pub use_color: bool,
    /// List every unit with health and items under the grid.
    pub show_units: bool,
    /// Show the phase hint and the message line.
    pub show_hint: bool,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            use_color: true,
            show_units: true,
            show_hint: true,
        }
    }
}

/// ANSI color codes.
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";

    pub const BLUE: &str = "\x1b[34m";
    pub const RED: &str = "\x1b[31m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const GREEN: &str = "\x1b[32m";
    pub const GRAY: &str = "\x1b[90m";
}

fn team_color(team: Team) -> &'static str {
    match team {
        Team::One => colors::BLUE,
        Team::Two => colors::RED,
    }
}

fn health_color(health: i32, max: i32) -> &'static str {
    let percent = health as f32 / max.max(1) as f32;
    if percent > 0.66 {
        colors::GREEN
    } else if percent > 0.33 {
        colors::YELLOW
    } else {
        colors::RED
    }
}

fn paint(text: &str, color: &str, config: &AsciiConfig) -> String {
    if config.use_color {
        format!("{color}{text}{}", colors::RESET)
    } else {
        text.to_string()
    }
}

fn short_name(name: &str) -> String {
    let short: String = name.chars().take(4).collect();
    format!("{short:<4}")
}

fn cell(view: &BattleView, pos: Position, config: &AsciiConfig) -> String {
    if let Some(unit) = view.unit_at(pos) {
        let (open, close) = match unit.team {
            Team::One => ('[', ']'),
            Team::Two => ('<', '>'),
        };
        let text = format!("{open}{}{close}", short_name(&unit.name));
        let color = if view.selected == Some(pos) {
            colors::BOLD
        } else {
            team_color(unit.team)
        };
        return paint(&text, color, config);
    }
    if view.highlights.moves.contains(&pos) {
        paint("  *   ", colors::GREEN, config)
    } else if view.highlights.attack_range.contains(&pos) {
        paint("  +   ", colors::YELLOW, config)
    } else {
        paint("  .   ", colors::GRAY, config)
    }
}

fn unit_line(unit: &UnitView, config: &AsciiConfig) -> String {
    let health = format!("HP {:>4}/{}", unit.health, unit.max_health);
    let mut line = format!(
        "  {} {:<12} {}  {}",
        paint(&format!("{}", unit.team.number()), team_color(unit.team), config),
        unit.name.chars().take(12).collect::<String>(),
        paint(&health, health_color(unit.health, unit.max_health), config),
        unit.primary,
    );
    if unit.secondary != "None" {
        let _ = write!(line, " + {}", unit.secondary);
    }
    if unit.special {
        line.push_str(" (special)");
    }
    line
}

/// Render a battle view as text.
#[must_use]
pub fn render_view(view: &BattleView, config: &AsciiConfig) -> String {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "{}",
        paint(
            &format!("== {} | {:?} ==", view.active_team, view.phase),
            colors::BOLD,
            config
        )
    );

    output.push_str("   ");
    for x in 0..view.width {
        let _ = write!(output, "{x:^6}");
    }
    output.push('\n');

    for y in 0..view.height {
        let _ = write!(output, "{y:>2} ");
        for x in 0..view.width {
            output.push_str(&cell(view, Position::new(x, y), config));
        }
        output.push('\n');
    }

    if config.show_units {
        output.push('\n');
        for unit in &view.units {
            output.push_str(&unit_line(unit, config));
            output.push('\n');
        }
    }

    if !view.actions.is_empty() {
        let labels: Vec<&str> = view.actions.iter().map(|a| a.label()).collect();
        let _ = writeln!(output, "Actions: {}", labels.join(" | "));
    }

    if config.show_hint {
        let _ = writeln!(output, "{}", view.hint);
        if let Some(message) = &view.message {
            let _ = writeln!(output, "> {message}");
        }
    }

    output
}

/// Renderer writing ASCII frames to any writer.
#[derive(Debug)]
pub struct AsciiRenderer<W: Write> {
    out: W,
    config: AsciiConfig,
    frames: usize,
}

impl<W: Write> AsciiRenderer<W> {
    /// Create a renderer.
    pub fn new(out: W, config: AsciiConfig) -> Self {
        Self {
            out,
            config,
            frames: 0,
        }
    }

    /// Frames drawn so far.
    #[must_use]
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Give back the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for AsciiRenderer<W> {
    fn redraw(&mut self, view: &BattleView) {
        let frame = render_view(view, &self.config);
        let written = self
            .out
            .write_all(frame.as_bytes())
            .and_then(|()| self.out.write_all(b"\n"))
            .and_then(|()| self.out.flush());
        match written {
            Ok(()) => self.frames += 1,
            Err(err) => tracing::warn!(error = %err, "Failed to draw frame"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::turn::{Intent, TurnMachine};
    use arena_test_utils::fixtures::duel;

    fn plain() -> AsciiConfig {
        AsciiConfig {
            use_color: false,
            ..AsciiConfig::default()
        }
    }

    #[test]
    fn test_short_name_pads_and_cuts() {
        assert_eq!(short_name("Al"), "Al  ");
        assert_eq!(short_name("Roland"), "Rola");
    }

    #[test]
    fn test_render_duel() {
        let bf = duel("Sword", "Bow");
        let view = BattleView::capture(&bf, &TurnMachine::new(Team::One, false));
        let output = render_view(&view, &plain());

        assert!(output.contains("[atta]<defe>"));
        assert!(output.contains("HP  100/100"));
        assert!(output.contains("Bow (A:8,D:0,R:3)"));
        assert!(!output.contains('\x1b'));
        assert_eq!(output.lines().filter(|l| l.starts_with(" 9 ")).count(), 1);
    }

    #[test]
    fn test_render_highlights() {
        let mut bf = duel("Sword", "Bow");
        let mut turn = TurnMachine::new(Team::One, false);
        turn.handle(&mut bf, Intent::SelectUnit(Position::new(0, 0)))
            .unwrap();
        turn.handle(&mut bf, Intent::Choose(arena_core::turn::Action::Move))
            .unwrap();

        let output = render_view(&BattleView::capture(&bf, &turn), &plain());
        assert_eq!(output.matches('*').count(), 4);
        assert!(output.contains("Actions: Move | Attack | End Turn"));
    }

    #[test]
    fn test_renderer_counts_frames() {
        let bf = duel("Sword", "Bow");
        let view = BattleView::observe(&bf, Team::One, Some("hello".into()));
        let mut renderer = AsciiRenderer::new(Vec::new(), plain());

        renderer.redraw(&view);
        renderer.redraw(&view);

        assert_eq!(renderer.frames(), 2);
        let text = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(text.matches("> hello").count(), 2);
    }
}
