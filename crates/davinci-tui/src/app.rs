use std::sync::Arc;
use std::time::Duration;

use davinci_core::{
    spawn_exchange, AskBackend, ChatEvent, ChatSession, Config, ExchangeHandle, Panels,
};
use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;

pub struct App {
    // Core state
    pub should_quit: bool,
    pub session: ChatSession,
    pub panels: Panels,

    // Input box
    pub input: String,
    pub input_cursor: usize, // cursor position in input, in chars

    // Chat view
    pub chat_scroll: u16,
    pub chat_height: u16, // Inner height of chat area for scroll calculations
    pub chat_width: u16,  // Inner width of chat area for wrap calculations
    pub chat_lines: u16,  // Wrapped line count of the last rendered chat
    pub follow_bottom: bool,

    // Animation state
    pub animation_frame: u8, // 0-2 for the thinking dots

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,

    pub endpoint: String,
    backend: Arc<dyn AskBackend>,
    reveal_delay: Duration,
    chat_tx: UnboundedSender<ChatEvent>,
    exchange: Option<ExchangeHandle>,
}

impl App {
    pub fn new(
        config: &Config,
        backend: Arc<dyn AskBackend>,
        chat_tx: UnboundedSender<ChatEvent>,
    ) -> Self {
        Self {
            should_quit: false,
            session: ChatSession::new(config.greeting.clone()),
            panels: Panels::default(),

            input: String::new(),
            input_cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_lines: 0,
            follow_bottom: true,

            animation_frame: 0,

            chat_area: None,

            endpoint: config.endpoint.clone(),
            backend,
            reveal_delay: config.reveal_delay(),
            chat_tx,
            exchange: None,
        }
    }

    pub fn can_send(&self) -> bool {
        self.session.can_send(&self.input)
    }

    /// Send whatever is in the input box. Does nothing while busy or when the
    /// input is blank.
    pub fn send_query(&mut self) {
        let Some(submission) = self.session.submit(&self.input) else {
            return;
        };

        self.input.clear();
        self.input_cursor = 0;
        self.animation_frame = 0;
        self.follow_bottom = true;

        self.exchange = Some(spawn_exchange(
            self.backend.clone(),
            submission,
            self.reveal_delay,
            self.chat_tx.clone(),
        ));
    }

    pub fn handle_chat_event(&mut self, event: ChatEvent) {
        if self.session.apply(event) {
            self.follow_bottom = true;
        }
        if !self.session.is_busy() {
            self.exchange = None;
        }
    }

    /// Start over with only the greeting, stopping any request or reveal
    /// still running for the old chat
    pub fn new_chat(&mut self) {
        self.cancel_exchange();
        self.session.reset();
        self.chat_scroll = 0;
        self.follow_bottom = true;
    }

    pub fn quit(&mut self) {
        self.cancel_exchange();
        self.should_quit = true;
    }

    fn cancel_exchange(&mut self) {
        if let Some(exchange) = self.exchange.take() {
            exchange.cancel();
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.show_thinking() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_bottom = false;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
        self.follow_bottom = self.chat_scroll >= max;
    }

    /// Scroll chat to bottom so the newest text is visible
    pub fn scroll_to_bottom(&mut self) {
        self.chat_scroll = self.max_scroll();
    }

    fn max_scroll(&self) -> u16 {
        self.chat_lines.saturating_sub(self.chat_height)
    }
}
