use std::collections::HashMap;
use std::io::{self, Write};

use studio_core::{AppViewModel, AttachmentView, MediaKind, MessageId, MessageView, Role, Source};
use studio_engine::{data_uri_mime, escape_html, is_safe_url, MarkdownRenderer};

/// Prints the conversation incrementally: new messages once, streamed
/// replies as their text grows.
#[derive(Debug, Default)]
pub(crate) struct TerminalPrinter {
    printed: HashMap<MessageId, usize>,
    status: Option<String>,
    error: Option<String>,
    open_line: bool,
}

impl TerminalPrinter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn render(&mut self, view: &AppViewModel) {
        let mut out = io::stdout().lock();
        let _ = self.render_to(view, &mut out, &mut io::stderr().lock());
        let _ = out.flush();
    }

    fn render_to(
        &mut self,
        view: &AppViewModel,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> io::Result<()> {
        if view.messages.is_empty() {
            self.printed.clear();
        }
        for message in &view.messages {
            match self.printed.get(&message.id).copied() {
                None => {
                    self.close_line(out)?;
                    write!(out, "{}> {}", role_label(message.role), message.text)?;
                    self.open_line = true;
                    write_extras(message, out, &mut self.open_line)?;
                    self.printed.insert(message.id, message.text.len());
                }
                Some(len) if message.text.len() > len => {
                    write!(out, "{}", &message.text[len..])?;
                    self.open_line = true;
                    self.printed.insert(message.id, message.text.len());
                }
                Some(_) => {}
            }
        }

        if view.loading_status != self.status {
            if let Some(status) = &view.loading_status {
                self.close_line(out)?;
                writeln!(err, "... {status}")?;
            }
            self.status = view.loading_status.clone();
        }
        if view.error != self.error {
            if let Some(error) = &view.error {
                self.close_line(out)?;
                writeln!(err, "error: {error}")?;
            }
            self.error = view.error.clone();
        }
        Ok(())
    }

    pub(crate) fn finish(&mut self) {
        let mut out = io::stdout().lock();
        let _ = self.close_line(&mut out);
        let _ = out.flush();
    }

    fn close_line(&mut self, out: &mut impl Write) -> io::Result<()> {
        if self.open_line {
            writeln!(out)?;
            self.open_line = false;
        }
        Ok(())
    }
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "you",
        Role::Assistant => "studio",
    }
}

fn write_extras(message: &MessageView, out: &mut impl Write, open_line: &mut bool) -> io::Result<()> {
    if message.attachments.is_empty() && message.sources.is_empty() {
        return Ok(());
    }
    writeln!(out)?;
    *open_line = false;
    for (index, attachment) in message.attachments.iter().enumerate() {
        writeln!(out, "  [{}] {}", index + 1, describe_media(&attachment.data_uri))?;
    }
    for source in &message.sources {
        writeln!(out, "  source: {}", describe_source(source))?;
    }
    Ok(())
}

/// One-line summary of a data URI: kind, media type and decoded size.
pub(crate) fn describe_media(data_uri: &str) -> String {
    let kind = match MediaKind::of(data_uri) {
        MediaKind::Image => "image",
        MediaKind::Video => "video",
    };
    let mime = data_uri_mime(data_uri).unwrap_or("unknown");
    let payload_len = data_uri.split_once(',').map_or(0, |(_, payload)| payload.len());
    format!("{kind} {mime}, {} KiB", payload_len * 3 / 4 / 1024)
}

fn describe_source(source: &Source) -> String {
    match (&source.title, &source.uri) {
        (Some(title), Some(uri)) => format!("{title} <{uri}>"),
        (None, Some(uri)) => uri.clone(),
        (Some(title), None) => title.clone(),
        (None, None) => "(untitled)".to_string(),
    }
}

/// Full HTML document of the conversation. Assistant text goes through the
/// markdown renderer; user text is escaped.
pub(crate) fn render_transcript(view: &AppViewModel, renderer: &dyn MarkdownRenderer) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Design Studio</title>\n</head>\n<body>\n",
    );
    html.push_str(&format!("<h1>{}</h1>\n", escape_html(view.mode.label())));
    for message in &view.messages {
        let class = match message.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        html.push_str(&format!("<section class=\"message {class}\">\n"));
        match message.role {
            Role::User => html.push_str(&format!("<p>{}</p>\n", escape_html(&message.text))),
            Role::Assistant => html.push_str(&renderer.render(&message.text)),
        }
        for attachment in &message.attachments {
            html.push_str(&media_tag(attachment));
        }
        if !message.sources.is_empty() {
            html.push_str("<ul class=\"sources\">\n");
            for source in &message.sources {
                html.push_str(&source_item(source));
            }
            html.push_str("</ul>\n");
        }
        html.push_str("</section>\n");
    }
    if let Some(error) = &view.error {
        html.push_str(&format!("<p class=\"error\">{}</p>\n", escape_html(error)));
    }
    html.push_str("</body>\n</html>\n");
    html
}

fn media_tag(attachment: &AttachmentView) -> String {
    let src = escape_html(&attachment.data_uri);
    match attachment.kind {
        MediaKind::Image => format!("<img src=\"{src}\" alt=\"generated image\">\n"),
        MediaKind::Video => format!("<video controls src=\"{src}\"></video>\n"),
    }
}

fn source_item(source: &Source) -> String {
    let title = escape_html(source.title.as_deref().unwrap_or("(untitled)"));
    match &source.uri {
        Some(uri) if is_safe_url(uri) => {
            format!("<li><a href=\"{}\">{title}</a></li>\n", escape_html(uri))
        }
        _ => format!("<li>{title}</li>\n"),
    }
}
