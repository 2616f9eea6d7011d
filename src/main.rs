mod config;
mod film_room;
mod gemini;
mod grounding;
mod logging;
mod markdown;
mod shell;
mod view;

use iced::{window, Font};

fn main() -> iced::Result {
    logging::initialize(&config::Config::get_config_dir());

    // A bad config still opens a window; the shell shows it in the fallback panel.
    let config = config::Config::load();
    let window_config = config
        .as_ref()
        .map(|config| config.window.clone())
        .unwrap_or_default();

    let result = iced::application("Film Room", shell::App::update, shell::App::view)
        .theme(shell::App::theme)
        .subscription(shell::App::subscription)
        .window(window::Settings {
            size: iced::Size::new(window_config.width as f32, window_config.height as f32),
            position: window::Position::Centered,
            ..Default::default()
        })
        .default_font(Font::MONOSPACE)
        .run_with(move || shell::App::new(config));

    if let Err(err) = &result {
        log::error!("Film room window failed: {}", err);
    }

    result
}
