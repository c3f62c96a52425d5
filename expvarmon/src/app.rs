//! App state and main loop: input handling, polling every service, and drawing.

use std::{
    fmt::Write as _,
    io,
    time::{Duration, Instant},
};

use chrono::{DateTime, Local};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::future::join_all;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::expvar::Fetcher;
use crate::service::Service;
use crate::ui::{
    header::draw_header, services::draw_services, spark::draw_sparks, status::draw_status,
};
use crate::var::VarName;

pub struct App<F> {
    services: Vec<Service>,
    vars: Vec<VarName>,
    fetcher: F,
    interval: Duration,

    last_poll: Option<Instant>,
    last_update: Option<DateTime<Local>>,
    pub selected: usize,

    // Quit flag
    should_quit: bool,
}

impl<F: Fetcher> App<F> {
    pub fn new(services: Vec<Service>, vars: Vec<VarName>, fetcher: F, interval: Duration) -> Self {
        Self {
            services,
            vars,
            fetcher,
            interval,
            last_poll: None,
            last_update: None,
            selected: 0,
            should_quit: false,
        }
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn selected_service(&self) -> Option<&Service> {
        self.services.get(self.selected)
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Update every service concurrently and wait for the whole round before returning.
    pub async fn poll_all(&mut self) {
        let fetcher = &self.fetcher;
        join_all(self.services.iter_mut().map(|s| s.update(fetcher))).await;
        self.last_poll = Some(Instant::now());
        self.last_update = Some(Local::now());
        debug!(services = self.services.len(), "poll round finished");
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!(services = self.services.len(), interval = ?self.interval, "starting monitor");

        // Terminal setup
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        // Main loop
        let res = self.event_loop(&mut terminal).await;

        // Teardown
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        self.shutdown();

        res
    }

    async fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        loop {
            // Input (non-blocking)
            while event::poll(Duration::from_millis(10))? {
                if let Event::Key(k) = event::read()? {
                    self.handle_key(k);
                }
            }
            if self.should_quit {
                break;
            }

            let due = self
                .last_poll
                .map_or(true, |at| at.elapsed() >= self.interval);
            if due {
                self.poll_all().await;
            }

            terminal.draw(|f| self.draw(f))?;

            sleep(Duration::from_millis(50)).await;
        }

        Ok(())
    }

    pub fn handle_key(&mut self, k: KeyEvent) {
        if k.kind == KeyEventKind::Release {
            return;
        }
        match k.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.services.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Char('r') => {
                if let Some(s) = self.services.get_mut(self.selected) {
                    s.acknowledge_restart();
                }
            }
            _ => {}
        }
    }

    pub fn draw(&self, f: &mut ratatui::Frame<'_>) {
        let area = f.area();
        let table_height = (self.services.len() as u16).saturating_add(3);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),            // header
                Constraint::Length(table_height), // services
                Constraint::Min(3),               // sparklines of the selected service
                Constraint::Length(1),            // status
            ])
            .split(area);

        draw_header(f, rows[0], self.services.len(), self.interval, self.last_update);
        draw_services(f, rows[1], &self.services, &self.vars, self.selected);
        if let Some(s) = self.selected_service() {
            draw_sparks(f, rows[2], s, &self.vars);
            draw_status(f, rows[3], s);
        }
    }

    /// Plain text snapshot of every service, used by `--dummy`.
    pub fn report(&self) -> String {
        let mut out = String::new();
        for s in &self.services {
            let status = match (&s.err, s.restarted) {
                (Some(e), _) => format!("error: {e}"),
                (None, true) => "restarted".to_string(),
                (None, false) => "ok".to_string(),
            };
            let _ = writeln!(out, "{} [{}] {}", s.name, s.url, status);
            if !s.cmdline.is_empty() {
                let _ = writeln!(out, "  cmdline: {}", s.cmdline);
            }
            for v in &self.vars {
                let max = s.max(v).unwrap_or_default();
                let _ = writeln!(out, "  {}: {} (max {})", v.long(), s.value(v), max);
            }
        }
        out
    }

    /// Close export files of every service.
    pub fn shutdown(&mut self) {
        for s in &mut self.services {
            s.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::expvar::Document;
    use crate::service::ServiceOptions;
    use crossterm::event::KeyModifiers;
    use ratatui::backend::TestBackend;
    use serde_json::json;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    /// Serves the same document to every port except 1, which refuses.
    struct Fixed {
        calls: AtomicUsize,
    }

    impl Fetcher for Fixed {
        fn fetch(&self, url: &Url) -> impl Future<Output = Result<Document>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let refuse = url.port() == Some(1);
            async move {
                if refuse {
                    return Err(Error::Fetch("connection refused".into()));
                }
                Ok(Document::new(json!({
                    "cmdline": ["/bin/demo"],
                    "memstats": { "Alloc": 4096, "PauseTotalNs": 10 },
                })))
            }
        }
    }

    fn app(ports: &[u16]) -> App<Fixed> {
        let vars = vec![VarName::new("mem:memstats.Alloc")];
        let opts = ServiceOptions::new(vars.clone(), 10);
        let services = ports
            .iter()
            .map(|p| Service::new(Url::parse(&format!("http://localhost:{p}/debug/vars")).unwrap(), &opts))
            .collect();
        let fetcher = Fixed { calls: AtomicUsize::new(0) };
        App::new(services, vars, fetcher, Duration::from_secs(1))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn poll_round_updates_every_service() {
        let mut a = app(&[1, 2000, 2001]);
        a.poll_all().await;
        assert_eq!(a.fetcher.calls.load(Ordering::SeqCst), 3);
        assert!(a.services()[0].err.is_some());
        assert_eq!(a.services()[1].name, "demo");
        assert_eq!(a.services()[2].value(&VarName::new("mem:memstats.Alloc")), "4.0KB");
    }

    #[tokio::test]
    async fn report_lists_values_and_errors() {
        let mut a = app(&[1, 2000]);
        a.poll_all().await;
        let text = a.report();
        assert!(text.contains("localhost:1 [http://localhost:1/debug/vars] error: fetch failed"));
        assert!(text.contains("demo [http://localhost:2000/debug/vars] ok"));
        assert!(text.contains("  memstats.Alloc: 4.0KB (max 4.0KB)"));
        assert!(text.contains("  cmdline: /bin/demo"));
    }

    #[test]
    fn selection_keys_stay_in_bounds() {
        let mut a = app(&[2000, 2001]);
        a.handle_key(key(KeyCode::Up));
        assert_eq!(a.selected, 0);
        a.handle_key(key(KeyCode::Down));
        a.handle_key(key(KeyCode::Char('j')));
        assert_eq!(a.selected, 1);
        a.handle_key(key(KeyCode::Char('k')));
        assert_eq!(a.selected, 0);
        assert!(!a.should_quit());
        a.handle_key(key(KeyCode::Char('q')));
        assert!(a.should_quit());
    }

    #[test]
    fn r_acknowledges_selected_restart() {
        let mut a = app(&[2000]);
        a.services[0].restarted = true;
        a.handle_key(key(KeyCode::Char('r')));
        assert!(!a.services()[0].restarted);
    }

    #[tokio::test]
    async fn draws_into_test_backend() {
        let mut a = app(&[2000, 1]);
        a.poll_all().await;
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| a.draw(f)).unwrap();
        let buf = terminal.backend().buffer().clone();
        let text: String = buf.content.iter().map(|c| c.symbol()).collect();
        assert!(text.contains("expvarmon"));
        assert!(text.contains("demo"));
        assert!(text.contains("ERR"));
        assert!(text.contains("Alloc"));
    }
}
