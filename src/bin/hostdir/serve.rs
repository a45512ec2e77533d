use std::sync::Arc;

use anyhow::Context as _;
use hostdir::{local_addr, urls, ServerConfig};

use crate::error::Result;

pub(crate) fn run(config: &ServerConfig) -> Result<()> {
    let local_ip = local_addr::resolve();

    if config.print_only {
        print_header("Candidate URLs:");
        print_urls(config.preferred_port, local_ip);
        return Ok(());
    }

    let outcome = file_serve::select(&file_serve::SocketProbe, &config.bind_request())?;
    log::debug!(
        "Selected {} ({}) from {}..={}",
        outcome.addr(),
        outcome.family,
        config.preferred_port,
        config.max_port
    );
    let server = Arc::new(file_serve::Server::bind(&config.root, outcome)?);

    {
        let server = server.clone();
        ctrlc::set_handler(move || server.close())
            .context("failed to install the Ctrl-C handler")?;
    }

    print_header(&format!(
        "Serving {} at {} ({})",
        server.source().display(),
        server.addr(),
        server.family()
    ));
    print_urls(server.addr().port(), local_ip);
    anstream::println!("Ctrl-C to stop the server");

    if config.open {
        open_browser(urls::index_url("localhost", server.addr().port()));
    }

    server.serve()?;
    anstream::println!();
    anstream::println!("Server stopped.");

    Ok(())
}

fn print_header(header: &str) {
    let style = anstyle::Style::new().bold();
    anstream::println!("{}{header}{}", style.render(), style.render_reset());
}

fn print_urls(port: u16, local_ip: std::net::Ipv4Addr) {
    for url in urls::candidate_urls(port, local_ip) {
        anstream::println!("  {url}");
    }
}

fn open_browser(url: String) {
    match open::that(&url) {
        Ok(()) => log::info!("Please check your browser!"),
        Err(why) => log::warn!("Failed to open {url}: {why}"),
    }
}
