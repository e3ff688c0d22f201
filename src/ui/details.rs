use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};

use crate::catalog::MovieDetails;
use crate::format::{ImageSize, format_date, format_image_url, format_rating, format_runtime};

use super::widgets::{rating_span, spinner, titled_block};

/// What the details page currently shows.
#[derive(Debug, Clone)]
pub enum DetailsPane {
    Closed,
    Loading(u64),
    Loaded(Box<MovieDetails>),
    NotFound(u64),
    /// Lookup for this id failed; `r` asks again.
    Failed(u64, String),
}

fn label(text: &str) -> Span<'_> {
    Span::styled(
        format!("{:<14}", text),
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
    )
}

/// Text lines for a loaded movie.
pub fn details_lines(
    details: &MovieDetails,
    poster_size: ImageSize,
    image_base: &str,
) -> Vec<Line<'static>> {
    let movie = &details.movie;
    let mut lines = vec![Line::from(Span::styled(
        movie.title.clone(),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ))];

    if movie.original_title != movie.title && !movie.original_title.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("Original Title: {}", movie.original_title),
            Style::default().fg(Color::Gray),
        )));
    }

    if !details.tagline.is_empty() {
        lines.push(Line::from(Span::styled(
            details.tagline.clone(),
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines.push(Line::default());
    lines.push(Line::from(vec![
        label("Rating"),
        rating_span(&format_rating(movie.vote_average), movie.vote_average),
        Span::styled(
            format!(" ({} votes)", movie.vote_count),
            Style::default().fg(Color::DarkGray),
        ),
    ]));
    lines.push(Line::from(vec![
        label("Release Date"),
        Span::raw(format_date(&movie.release_date)),
    ]));
    if let Some(runtime) = details.runtime {
        lines.push(Line::from(vec![label("Runtime"), Span::raw(format_runtime(runtime))]));
    }
    if !details.status.is_empty() {
        lines.push(Line::from(vec![label("Status"), Span::raw(details.status.clone())]));
    }
    if !movie.original_language.is_empty() {
        lines.push(Line::from(vec![
            label("Language"),
            Span::raw(movie.original_language.clone()),
        ]));
    }
    if details.budget > 0 {
        lines.push(Line::from(vec![label("Budget"), Span::raw(format!("${}", details.budget))]));
    }
    if details.revenue > 0 {
        lines.push(Line::from(vec![label("Revenue"), Span::raw(format!("${}", details.revenue))]));
    }
    if !details.genres.is_empty() {
        let names: Vec<&str> = details.genres.iter().map(|g| g.name.as_str()).collect();
        lines.push(Line::from(vec![
            label("Genres"),
            Span::styled(names.join(", "), Style::default().fg(Color::Cyan)),
        ]));
    }

    let poster = format_image_url(movie.poster_path.as_deref(), poster_size, image_base)
        .unwrap_or_else(|| "No Image Available".to_string());
    lines.push(Line::from(vec![label("Poster"), Span::raw(poster)]));
    if let Some(backdrop) =
        format_image_url(movie.backdrop_path.as_deref(), ImageSize::Original, image_base)
    {
        lines.push(Line::from(vec![label("Backdrop"), Span::raw(backdrop)]));
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Overview",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    let overview = if movie.overview.is_empty() {
        "No overview available.".to_string()
    } else {
        movie.overview.clone()
    };
    lines.push(Line::from(overview));

    lines
}

pub fn render_details_view(
    frame: &mut Frame,
    area: Rect,
    pane: &DetailsPane,
    poster_size: ImageSize,
    image_base: &str,
    tick: usize,
    accent: Color,
) {
    let para = match pane {
        DetailsPane::Closed => Paragraph::new("").block(titled_block("Movie", accent)),
        DetailsPane::Loading(_) => Paragraph::new(format!("{} Loading movie...", spinner(tick)))
            .style(Style::default().fg(Color::DarkGray))
            .block(titled_block("Movie", accent)),
        DetailsPane::Loaded(details) => {
            Paragraph::new(details_lines(details, poster_size, image_base))
                .block(titled_block(&details.movie.title, accent))
        }
        DetailsPane::NotFound(id) => Paragraph::new(vec![
            Line::from(Span::styled(
                "Movie Not Found",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::default(),
            Line::from(format!("The movie you're looking for (id {}) doesn't exist.", id)),
        ])
        .alignment(Alignment::Center)
        .block(titled_block("Movie", accent)),
        DetailsPane::Failed(_, error) => Paragraph::new(error.clone())
            .style(Style::default().fg(Color::Red))
            .block(titled_block("Movie", accent)),
    };

    frame.render_widget(para.wrap(Wrap { trim: false }), area);
}
