use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph, Wrap},
};

use crate::catalog::{Listing, Movie};
use crate::feed::FeedView;
use crate::format::{format_rating, release_year};

use super::widgets::{rating_span, spinner, titled_block};

fn truncate_title(title: &str, max_width: usize) -> String {
    if title.is_empty() {
        return "Untitled".to_string();
    }

    if max_width <= 3 {
        return "...".to_string();
    }

    if title.chars().count() <= max_width {
        return title.to_string();
    }

    let kept: String = title.chars().take(max_width - 3).collect();
    format!("{}...", kept.trim_end())
}

pub fn render_browse_view(
    frame: &mut Frame,
    area: Rect,
    listing: Listing,
    feed: FeedView<'_>,
    list_state: &mut ListState,
    tick: usize,
    accent: Color,
) {
    // Nothing loaded and the first page failed: the error is the whole view
    if let (Some(error), true) = (feed.error, feed.items.is_empty()) {
        render_load_error(frame, area, listing, error, accent);
        return;
    }

    if feed.items.is_empty() && feed.is_loading {
        let loading = Paragraph::new(format!("{} Loading movies...", spinner(tick)))
            .block(titled_block(listing.as_display(), accent))
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(loading, area);
        return;
    }

    if feed.items.is_empty() && !feed.has_more && feed.error.is_none() {
        let empty = Paragraph::new("No movies found.")
            .block(titled_block(listing.as_display(), accent))
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    render_movie_list(frame, chunks[0], listing, feed.items, list_state, accent);
    render_footer(frame, chunks[1], &feed, tick);
}

fn render_movie_list(
    frame: &mut Frame,
    area: Rect,
    listing: Listing,
    movies: &[Movie],
    list_state: &mut ListState,
    accent: Color,
) {
    let title_width = area.width.saturating_sub(22) as usize;

    let items: Vec<ListItem> = movies
        .iter()
        .map(|m| {
            let line = Line::from(vec![
                rating_span(&format_rating(m.vote_average), m.vote_average),
                Span::raw(" │ "),
                Span::styled(
                    format!("{:>4}", release_year(&m.release_date)),
                    Style::default().fg(Color::Cyan),
                ),
                Span::raw(" │ "),
                Span::styled(
                    truncate_title(&m.title, title_width),
                    Style::default().fg(Color::White),
                ),
            ]);
            ListItem::new(line)
        })
        .collect();

    let title = format!("{} ({})", listing.as_display(), movies.len());
    let list = List::new(items)
        .block(titled_block(&title, accent))
        .highlight_style(
            Style::default()
                .bg(accent)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");

    frame.render_stateful_widget(list, area, list_state);
}

fn render_footer(frame: &mut Frame, area: Rect, feed: &FeedView<'_>, tick: usize) {
    let line = if feed.is_loading {
        Line::from(Span::styled(
            format!("{} Loading more movies...", spinner(tick)),
            Style::default().fg(Color::DarkGray),
        ))
    } else if let Some(error) = feed.error {
        Line::from(Span::styled(error.to_string(), Style::default().fg(Color::Red)))
    } else if !feed.has_more && !feed.items.is_empty() {
        Line::from(Span::styled(
            "You've reached the end! No more movies to load.",
            Style::default().fg(Color::Green),
        ))
    } else {
        Line::default()
    };

    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn render_load_error(frame: &mut Frame, area: Rect, listing: Listing, error: &str, accent: Color) {
    let text = vec![
        Line::from(Span::styled(
            "Error Loading Movies",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(error.to_string()),
    ];

    let para = Paragraph::new(text)
        .block(titled_block(listing.as_display(), accent))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(para, area);
}
