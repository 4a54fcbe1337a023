//! Notification channels
//!
//! Transports used by the forwarding sink to deliver formatted alert text: terminal,
//! log, email and desktop popup.

use chrono::Local;
use std::io::{self, Write};
use std::process::{Command, Stdio};

/// Transport for a formatted alert message
pub trait NotificationChannel: Send + Sync {
    /// Deliver `message` to `destination`; returns whether delivery succeeded
    fn send(&self, message: &str, destination: &str) -> bool;

    /// Channel name for identification
    fn channel_name(&self) -> &str;

    /// Whether the channel can currently deliver
    fn is_available(&self) -> bool;
}

/// Terminal/console channel
///
/// Writes alerts to stdout/stderr with colored formatting
pub struct ConsoleChannel {
    /// Use stderr instead of stdout
    use_stderr: bool,
    /// Use colors (ANSI escape codes)
    use_colors: bool,
}

impl ConsoleChannel {
    /// Create a new console channel writing to stderr
    pub fn new() -> Self {
        Self {
            use_stderr: true,
            use_colors: Self::supports_color(),
        }
    }

    /// Create a channel that uses stdout
    pub fn stdout() -> Self {
        Self {
            use_stderr: false,
            use_colors: Self::supports_color(),
        }
    }

    /// Create a channel without colors
    pub fn no_color() -> Self {
        Self {
            use_stderr: true,
            use_colors: false,
        }
    }

    /// Check if terminal supports colors
    fn supports_color() -> bool {
        std::env::var("TERM")
            .map(|term| term != "dumb")
            .unwrap_or(false)
    }

    /// Format a message line
    fn format_line(&self, message: &str, destination: &str) -> String {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        format!(
            "[{}] {} -> {}: {}",
            timestamp,
            self.format_label(message),
            destination,
            message
        )
    }

    /// Colored label picked from the severity tag the message starts with
    fn format_label(&self, message: &str) -> String {
        if !self.use_colors {
            return "CONSUMPTION ALERT".to_string();
        }

        let color_code = if message.starts_with("[CRITICA]") {
            "\x1b[35m\x1b[1m" // Bold Magenta
        } else if message.starts_with("[ALTA]") {
            "\x1b[31m" // Red
        } else if message.starts_with("[MEDIA]") {
            "\x1b[33m" // Yellow
        } else {
            "\x1b[36m" // Cyan
        };

        format!("{}CONSUMPTION ALERT\x1b[0m", color_code)
    }
}

impl Default for ConsoleChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationChannel for ConsoleChannel {
    fn send(&self, message: &str, destination: &str) -> bool {
        let line = self.format_line(message, destination);

        let written = if self.use_stderr {
            let stderr = io::stderr();
            let mut handle = stderr.lock();
            writeln!(handle, "{}", line)
        } else {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", line)
        };

        written.is_ok()
    }

    fn channel_name(&self) -> &str {
        "CONSOLE_LOG"
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Channel writing through the `log` facade
#[derive(Debug, Default)]
pub struct LogChannel;

impl NotificationChannel for LogChannel {
    fn send(&self, message: &str, destination: &str) -> bool {
        log::info!(target: "hydrowatch::notify", "to={} {}", destination, message);
        true
    }

    fn channel_name(&self) -> &str {
        "LOG"
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Email channel
///
/// Delivery is simulated: the SMTP transport is owned by the deployment, this channel
/// validates the address and records the outgoing message in the log.
#[derive(Debug, Clone)]
pub struct EmailChannel {
    server: String,
    port: u16,
    sender: String,
    configured: bool,
}

impl EmailChannel {
    /// Unconfigured channel; reports itself unavailable
    pub fn unconfigured() -> Self {
        Self {
            server: "smtp.example.com".to_string(),
            port: 587,
            sender: "alerts@hydrowatch.local".to_string(),
            configured: false,
        }
    }

    /// Configured channel
    pub fn new(server: impl Into<String>, port: u16, sender: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            port,
            sender: sender.into(),
            configured: true,
        }
    }

    /// SMTP endpoint as `host:port`
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.server, self.port)
    }

    /// Minimal address check: `local@domain.tld`
    pub fn is_valid_address(address: &str) -> bool {
        let Some((local, domain)) = address.split_once('@') else {
            return false;
        };
        let Some((host, tld)) = domain.rsplit_once('.') else {
            return false;
        };

        !local.is_empty()
            && !host.is_empty()
            && tld.len() >= 2
            && tld.chars().all(|c| c.is_ascii_alphabetic())
            && !address.chars().any(char::is_whitespace)
            && !domain.contains('@')
    }
}

impl Default for EmailChannel {
    fn default() -> Self {
        Self::unconfigured()
    }
}

impl NotificationChannel for EmailChannel {
    fn send(&self, message: &str, destination: &str) -> bool {
        if !self.configured {
            log::warn!("Email channel is not configured");
            return false;
        }

        if !Self::is_valid_address(destination) {
            log::warn!("Invalid email address: {}", destination);
            return false;
        }

        log::info!(
            target: "hydrowatch::notify",
            "email via {} from={} to={} subject=\"Consumption alert\" body=\"{}\"",
            self.endpoint(),
            self.sender,
            destination,
            message
        );
        true
    }

    fn channel_name(&self) -> &str {
        "EMAIL"
    }

    fn is_available(&self) -> bool {
        self.configured
    }
}

/// Desktop popup channel
///
/// Uses `notify-send` on Linux and `msg` on Windows; falls back to the log elsewhere or
/// when the desktop tool cannot be started.
#[derive(Debug, Default)]
pub struct PopupChannel;

impl PopupChannel {
    fn desktop_command(message: &str, destination: &str) -> Option<Command> {
        if cfg!(target_os = "linux") {
            let mut cmd = Command::new("notify-send");
            cmd.arg("--urgency=critical")
                .arg("Consumption alert")
                .arg(format!("Subject: {}\n{}", destination, message));
            Some(cmd)
        } else if cfg!(windows) {
            let mut cmd = Command::new("msg");
            cmd.arg("*")
                .arg(format!("Consumption alert - {}: {}", destination, message));
            Some(cmd)
        } else {
            None
        }
    }

    fn fallback(message: &str, destination: &str) -> bool {
        log::warn!(target: "hydrowatch::notify", "popup for {}: {}", destination, message);
        true
    }
}

impl NotificationChannel for PopupChannel {
    fn send(&self, message: &str, destination: &str) -> bool {
        let Some(mut cmd) = Self::desktop_command(message, destination) else {
            return Self::fallback(message, destination);
        };

        match cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) => status.success(),
            Err(e) => {
                log::debug!("Desktop notifier unavailable: {}", e);
                Self::fallback(message, destination)
            }
        }
    }

    fn channel_name(&self) -> &str {
        "POPUP"
    }

    fn is_available(&self) -> bool {
        true
    }
}
