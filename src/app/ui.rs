use crate::app::{App, surface::TerminalSurface};

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let control_str = " q: Quit | p: Pause | r: Resume | ←/→: Length | -/+: Rows | </>: Cols \
                           | y/Y: Y min | u/U: Y max ";

        let main_block = Block::bordered()
            .title(" sweepscope ")
            .title_alignment(Alignment::Left)
            .border_type(BorderType::Rounded)
            .title_bottom(control_str);

        let main_interior = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![
                // Trace
                Constraint::Percentage(80),
                // Logs
                Constraint::Percentage(20),
                // Status bar
                Constraint::Max(2),
            ])
            .split(main_block.inner(area));

        main_block.render(area, buf);

        // The canvas is presented 1:1, so whatever size this ends up being is the viewport
        let trace_block = Block::bordered()
            .title(" Trace ")
            .border_type(BorderType::Rounded);
        let trace_area = trace_block.inner(main_interior[0]);
        trace_block.render(main_interior[0], buf);
        self.viewport_hint = Some(TerminalSurface::pixel_size(trace_area));
        self.scope
            .present(&mut TerminalSurface::new(trace_area, buf));

        tui_logger::TuiLoggerWidget::default()
            .block(Block::bordered().title(" Log "))
            .output_separator('|')
            .output_timestamp(Some("%H:%M:%S".to_string()))
            .output_level(Some(tui_logger::TuiLoggerLevelOutput::Long))
            .output_target(false)
            .output_file(false)
            .output_line(false)
            .render(main_interior[1], buf);

        let status_block = Block::new()
            .borders(Borders::TOP)
            .border_type(BorderType::Plain);
        let status_area = status_block.inner(main_interior[2]);
        let status_layout = Layout::horizontal([
            Constraint::Length(16),
            Constraint::Length(28),
            Constraint::Fill(1),
        ])
        .split(status_area);

        let (signal, signal_color) = match self.control.is_running() {
            true => ("Signal: Running", Color::Green),
            false => ("Signal: Paused", Color::Yellow),
        };
        Paragraph::new(signal)
            .style(
                Style::default()
                    .fg(signal_color)
                    .add_modifier(Modifier::BOLD),
            )
            .render(status_layout[0], buf);

        let producer = match &self.producer_halted {
            None => Paragraph::new("Producer: OK"),
            Some(reason) => Paragraph::new(format!("Producer: halted ({reason})"))
                .style(Style::default().fg(Color::Red)),
        };
        producer.render(status_layout[1], buf);

        let params = self.scope.params();
        let config = params.config();
        let pending = self
            .scope
            .pending()
            .map_or_else(|_| "?".to_owned(), |n| n.to_string());
        Paragraph::new(format!(
            "{} Hz | {} samples/sweep | {}x{} grid | y {}..{} | {} pending",
            config.sampling_rate,
            config.trace_length,
            config.rows,
            config.cols,
            config.y_min,
            config.y_max,
            pending
        ))
        .alignment(Alignment::Right)
        .render(status_layout[2], buf);

        status_block.render(main_interior[2], buf);
    }
}
