use iced::widget::{button, column, container, row, scrollable, text, text_input, Column, Row};
use iced::{alignment, Element, Font, Length};

use crate::film_room::{FilmRoom, Message, RequestState, SPINNER_FRAMES, SUGGESTIONS};
use crate::markdown;

const TIPS: [(&str, &str); 2] = [
    (
        "Study Opponents",
        "Use the Film Room to understand different philosophies. If you're facing a \"Triple Option\" team, search for how to defend it to adjust your defensive sliders.",
    ),
    (
        "Tactical Advantage",
        "Research specific passing concepts like \"Smash\" or \"Y-Cross\" to see when they are most effective against common high school defensive schemes.",
    ),
];

pub fn query_input_id() -> text_input::Id {
    text_input::Id::new("film-room-query")
}

fn bold() -> Font {
    Font {
        weight: iced::font::Weight::Bold,
        ..Font::MONOSPACE
    }
}

impl FilmRoom {
    pub fn view(&self) -> Element<Message> {
        let header = column![
            text("COACHING FILM ROOM").size(30).font(bold()),
            text("Research real-world tactics to get an edge on Friday night.").size(14),
        ]
        .spacing(6);

        let input = text_input("Ask the veterans about any tactic...", self.query())
            .on_input(Message::QueryChanged)
            .on_submit(Message::Submit)
            .id(query_input_id())
            .padding(15)
            .size(18);

        let label = if self.is_loading() { "Analyzing..." } else { "Analyze Film" };
        let submit = button(text(label).size(14).font(bold()))
            .padding(15)
            .on_press_maybe((!self.is_loading()).then_some(Message::Submit));

        let chips = SUGGESTIONS.chunks(2).map(|pair| -> Element<'_, Message> {
            Row::with_children(pair.iter().map(|&suggestion| -> Element<'_, Message> {
                button(text(suggestion).size(12))
                    .style(button::secondary)
                    .padding([6, 14])
                    .on_press(Message::SuggestionPicked(suggestion))
                    .into()
            }))
            .spacing(8)
            .into()
        });

        let mut form = column![
            row![input, submit].spacing(10),
            Column::with_children(chips).spacing(8),
        ]
        .spacing(16);

        if let Some(outcome) = self.outcome_view() {
            form = form.push(outcome);
        }

        let tips = Row::with_children(TIPS.iter().map(|&(title, body)| -> Element<'_, Message> {
            container(
                column![text(title).size(16).font(bold()), text(body).size(12)].spacing(8),
            )
            .padding(16)
            .width(Length::Fill)
            .style(container::rounded_box)
            .into()
        }))
        .spacing(16);

        let content = column![
            header,
            container(form)
                .padding(20)
                .width(Length::Fill)
                .style(container::bordered_box),
            tips,
        ]
        .spacing(24)
        .padding(24);

        scrollable(content).height(Length::Fill).into()
    }

    fn outcome_view(&self) -> Option<Element<'_, Message>> {
        let result = match self.state() {
            RequestState::Idle => return None,
            RequestState::Loading { .. } => {
                let spinner = SPINNER_FRAMES[self.loading_frame()];
                return Some(
                    container(
                        column![text(spinner).size(32), text("Running the tapes...").size(13)]
                            .spacing(10)
                            .align_x(alignment::Horizontal::Center),
                    )
                    .width(Length::Fill)
                    .padding(30)
                    .align_x(alignment::Horizontal::Center)
                    .into(),
                );
            }
            RequestState::Success(text) | RequestState::Error(text) => text,
        };

        let mut outcome = column![container(markdown::render(result))
            .padding(20)
            .width(Length::Fill)
            .style(container::rounded_box)]
        .spacing(14);

        if !self.sources().is_empty() {
            let links = self.sources().iter().map(|source| -> Element<'_, Message> {
                button(text(format!("🔗 {}", source.title)).size(12))
                    .style(button::text)
                    .on_press(Message::OpenSource(source.uri.clone()))
                    .into()
            });
            outcome = outcome.push(
                column![
                    text("SCOUTING SOURCES").size(11).font(bold()),
                    Column::with_children(links).spacing(2),
                ]
                .spacing(6),
            );
        }

        let copy = container(
            button(text("[Copy]").size(14))
                .on_press(Message::CopyResult)
                .padding(10),
        )
        .width(Length::Fill)
        .align_x(alignment::Horizontal::Right);

        Some(outcome.push(copy).into())
    }
}
