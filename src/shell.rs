//! Application shell: mounts the film room, or a fallback panel when that fails.

use std::sync::Arc;

use anyhow::{Context, Result};
use iced::{
    alignment,
    event::{self, Event as IcedEvent},
    keyboard::{self, Key},
    widget::{button, column, container, text, text_input},
    Element, Length, Subscription, Task, Theme,
};

use crate::config::{Config, ConfigError};
use crate::film_room::{self, FilmRoom};
use crate::gemini::GeminiClient;
use crate::view;

#[derive(Debug, Clone)]
pub enum Message {
    FilmRoom(film_room::Message),
    Reload,
    Exit,
}

pub enum Shell {
    Mounted(FilmRoom),
    Fallback { error: String },
}

/// Builds a ready-to-use film room from configuration.
pub fn boot(config: &Config) -> Result<FilmRoom> {
    let client = GeminiClient::with_config(&config.gemini, config.gemini.api_key())
        .context("could not create the Gemini client")?;

    log::info!("Film room ready (model {})", client.get_model());

    Ok(FilmRoom::new(Arc::new(client)))
}

pub fn mount(config: Result<Config, ConfigError>) -> Shell {
    let mounted = config
        .context("could not load configuration")
        .and_then(|config| boot(&config));

    match mounted {
        Ok(room) => Shell::Mounted(room),
        Err(err) => {
            log::error!("Could not mount the film room: {:#}", err);
            Shell::Fallback {
                error: format!("{:#}", err),
            }
        }
    }
}

pub struct App {
    shell: Shell,
}

impl App {
    pub fn new(config: Result<Config, ConfigError>) -> (Self, Task<Message>) {
        let app = App {
            shell: mount(config),
        };
        let focus = app.focus_query();
        (app, focus)
    }

    #[cfg(test)]
    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    fn focus_query(&self) -> Task<Message> {
        match self.shell {
            Shell::Mounted(_) => text_input::focus(view::query_input_id()),
            Shell::Fallback { .. } => Task::none(),
        }
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::FilmRoom(message) => match &mut self.shell {
                Shell::Mounted(room) => room.update(message).map(Message::FilmRoom),
                Shell::Fallback { .. } => Task::none(),
            },
            Message::Reload => {
                log::info!("Reloading film room");
                self.shell = mount(Config::load());
                self.focus_query()
            }
            Message::Exit => iced::exit(),
        }
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let room = match &self.shell {
            Shell::Mounted(room) => room.subscription().map(Message::FilmRoom),
            Shell::Fallback { .. } => Subscription::none(),
        };

        let events = event::listen_with(|event, _status, _id| {
            if let IcedEvent::Keyboard(keyboard::Event::KeyPressed {
                key: Key::Named(keyboard::key::Named::Escape),
                ..
            }) = event
            {
                Some(Message::Exit)
            } else {
                None
            }
        });

        Subscription::batch([room, events])
    }

    pub fn view(&self) -> Element<Message> {
        match &self.shell {
            Shell::Mounted(room) => room.view().map(Message::FilmRoom),
            Shell::Fallback { error } => fallback_view(error),
        }
    }

    pub fn theme(&self) -> Theme {
        Theme::TokyoNight
    }
}

fn fallback_view(error: &str) -> Element<'_, Message> {
    let panel = column![
        text("Something went wrong").size(26),
        text(error).size(14),
        button(text("Reload").size(14))
            .on_press(Message::Reload)
            .padding(12),
    ]
    .spacing(16)
    .max_width(560)
    .align_x(alignment::Horizontal::Center);

    container(panel)
        .width(Length::Fill)
        .height(Length::Fill)
        .align_x(alignment::Horizontal::Center)
        .align_y(alignment::Vertical::Center)
        .into()
}
