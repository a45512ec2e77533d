use std::io::Write as _;
use std::net::Ipv4Addr;
use std::path::PathBuf;

use anyhow::Context as _;
use hostdir::config::{self, ServerConfig};

use crate::error::Result;

/// Serve a directory over HTTP on the first free port
#[derive(Clone, Debug, clap::Parser)]
#[command(about, version)]
pub(crate) struct Args {
    /// Directory to serve
    #[arg(value_name = "PATH", default_value = ".")]
    pub(crate) path: PathBuf,

    /// Port to try first; the next free one is used when it is taken
    #[arg(short = 'p', long, value_name = "NUM", default_value_t = config::DEFAULT_PORT)]
    pub(crate) port: u16,

    /// Last port to try [default: PORT + 100]
    #[arg(long, value_name = "NUM")]
    pub(crate) max_port: Option<u16>,

    /// Address for IPv4-only listening (dual-stack always listens on all interfaces)
    #[arg(short = 'H', long, value_name = "IPV4", default_value_t = Ipv4Addr::UNSPECIFIED)]
    pub(crate) host: Ipv4Addr,

    /// Skip dual-stack and listen on IPv4 only
    #[arg(long)]
    pub(crate) ipv4_only: bool,

    /// Print the URLs the server would use and exit without listening
    #[arg(long)]
    pub(crate) print_only: bool,

    /// Open a browser once listening
    #[arg(long)]
    pub(crate) open: bool,

    #[command(flatten)]
    pub(crate) color: colorchoice_clap::Color,

    #[command(flatten)]
    pub(crate) verbose: clap_verbosity_flag::Verbosity<clap_verbosity_flag::WarnLevel>,
}

impl Args {
    pub(crate) fn to_config(&self) -> Result<ServerConfig> {
        let max_port = self
            .max_port
            .unwrap_or_else(|| config::default_max_port(self.port));
        if max_port < self.port {
            anyhow::bail!(
                "`--max-port` ({max_port}) must not be lower than `--port` ({})",
                self.port
            );
        }

        let root = dunce::canonicalize(&self.path)
            .with_context(|| format!("cannot serve `{}`", self.path.display()))?;
        if !root.is_dir() {
            anyhow::bail!("`{}` is not a directory", self.path.display());
        }

        Ok(ServerConfig {
            root,
            preferred_port: self.port,
            max_port,
            bind_host: self.host,
            ipv4_only: self.ipv4_only,
            print_only: self.print_only,
            open: self.open,
        })
    }
}

pub(crate) fn init_logging(
    verbose: &clap_verbosity_flag::Verbosity<clap_verbosity_flag::WarnLevel>,
    colored: bool,
) {
    let Some(level) = verbose.log_level() else {
        return;
    };

    let palette = if colored {
        Palette::colored()
    } else {
        Palette::plain()
    };

    let mut builder = env_logger::Builder::new();
    builder.write_style(if colored {
        env_logger::WriteStyle::Always
    } else {
        env_logger::WriteStyle::Never
    });
    builder.filter(None, level.to_level_filter());

    if level == log::Level::Trace || level == log::Level::Debug {
        builder.format_timestamp_secs();
    } else {
        builder.format(move |f, record| match record.level() {
            log::Level::Error => writeln!(f, "{}: {}", palette.error("error"), record.args()),
            log::Level::Warn => writeln!(f, "{}: {}", palette.warn("warning"), record.args()),
            log::Level::Info => writeln!(f, "{}", record.args()),
            log::Level::Debug => writeln!(f, "{}: {}", palette.debug("debug"), record.args()),
            log::Level::Trace => writeln!(f, "{}: {}", palette.trace("trace"), record.args()),
        });
    }

    builder.init();
}

#[derive(Copy, Clone, Default, Debug)]
struct Palette {
    error: anstyle::Style,
    warn: anstyle::Style,
    debug: anstyle::Style,
    trace: anstyle::Style,
}

impl Palette {
    fn colored() -> Self {
        Self {
            error: anstyle::AnsiColor::Red.on_default() | anstyle::Effects::BOLD,
            warn: anstyle::AnsiColor::Yellow.on_default(),
            debug: anstyle::AnsiColor::Blue.on_default(),
            trace: anstyle::AnsiColor::Cyan.on_default(),
        }
    }

    fn plain() -> Self {
        Self::default()
    }

    fn error<D: std::fmt::Display>(self, display: D) -> Styled<D> {
        Styled::new(display, self.error)
    }

    fn warn<D: std::fmt::Display>(self, display: D) -> Styled<D> {
        Styled::new(display, self.warn)
    }

    fn debug<D: std::fmt::Display>(self, display: D) -> Styled<D> {
        Styled::new(display, self.debug)
    }

    fn trace<D: std::fmt::Display>(self, display: D) -> Styled<D> {
        Styled::new(display, self.trace)
    }
}

#[derive(Debug)]
pub(crate) struct Styled<D> {
    display: D,
    style: anstyle::Style,
}

impl<D: std::fmt::Display> Styled<D> {
    pub(crate) fn new(display: D, style: anstyle::Style) -> Self {
        Self { display, style }
    }
}

impl<D: std::fmt::Display> std::fmt::Display for Styled<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.style.render(), self.display, self.style.render_reset())
    }
}
