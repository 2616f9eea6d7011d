use iced::widget::{container, row, text, Column};
use iced::{Element, Font, Length, Padding};
use pulldown_cmark::{Event, Parser, Tag};

/// A flattened block of an answer. Inline styling (emphasis, links) is reduced to plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
    ListItem { marker: String, depth: usize, text: String },
    Code(String),
    Rule,
}

#[derive(Default)]
struct Flattener {
    blocks: Vec<Block>,
    buf: String,
    lists: Vec<Option<u64>>,
    item: Option<(String, usize)>,
    in_code: bool,
}

impl Flattener {
    /// Emits the buffered text. A pending list marker is consumed even when the text is empty.
    fn flush(&mut self) {
        let text = self.buf.trim().to_string();
        self.buf.clear();
        let item = self.item.take();
        if text.is_empty() {
            return;
        }
        match item {
            Some((marker, depth)) => self.blocks.push(Block::ListItem {
                marker,
                depth,
                text,
            }),
            None => self.blocks.push(Block::Paragraph(text)),
        }
    }

    fn start_item(&mut self) {
        self.flush();
        let depth = self.lists.len();
        let marker = match self.lists.last_mut() {
            Some(Some(next)) => {
                let marker = format!("{}.", next);
                *next += 1;
                marker
            }
            _ => "•".to_string(),
        };
        self.item = Some((marker, depth));
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Heading(..)) | Event::Start(Tag::BlockQuote) => self.flush(),
            Event::Start(Tag::List(start)) => {
                self.flush();
                self.lists.push(start);
            }
            Event::Start(Tag::Item) => self.start_item(),
            Event::Start(Tag::CodeBlock(_)) => {
                self.flush();
                self.in_code = true;
            }
            Event::End(Tag::Heading(level, ..)) => {
                let text = self.buf.trim().to_string();
                self.buf.clear();
                self.blocks.push(Block::Heading {
                    level: level as u8,
                    text,
                });
            }
            Event::End(Tag::CodeBlock(_)) => {
                let code = self.buf.trim_end_matches('\n').to_string();
                self.buf.clear();
                self.in_code = false;
                self.blocks.push(Block::Code(code));
            }
            Event::End(Tag::List(_)) => {
                self.flush();
                self.lists.pop();
            }
            Event::End(Tag::Paragraph) | Event::End(Tag::Item) | Event::End(Tag::BlockQuote) => {
                self.flush()
            }
            Event::Text(t) | Event::Code(t) => self.buf.push_str(&t),
            Event::SoftBreak => self.buf.push(if self.in_code { '\n' } else { ' ' }),
            Event::HardBreak => self.buf.push('\n'),
            Event::Rule => {
                self.flush();
                self.blocks.push(Block::Rule);
            }
            _ => {}
        }
    }
}

pub fn to_blocks(markdown: &str) -> Vec<Block> {
    let mut flattener = Flattener::default();
    for event in Parser::new(markdown) {
        flattener.handle(event);
    }
    flattener.flush();
    flattener.blocks
}

pub fn render<'a, Message: 'a>(markdown: &str) -> Element<'a, Message> {
    let children = to_blocks(markdown).into_iter().map(|block| -> Element<'a, Message> {
        match block {
            Block::Heading { level, text: heading } => {
                let size: f32 = match level {
                    1 => 24.0,
                    2 => 20.0,
                    _ => 17.0,
                };
                text(heading).size(size).into()
            }
            Block::Paragraph(body) => text(body).size(15).into(),
            Block::ListItem { marker, depth, text: body } => row![
                text(marker).size(15).width(Length::Fixed(22.0)),
                text(body).size(15)
            ]
            .padding(Padding {
                left: (depth.saturating_sub(1) * 18) as f32,
                ..Padding::ZERO
            })
            .into(),
            Block::Code(code) => container(text(code).size(14).font(Font::MONOSPACE))
                .padding(10)
                .style(container::rounded_box)
                .into(),
            Block::Rule => text("────────").size(15).into(),
        }
    });

    Column::with_children(children).spacing(12).into()
}
