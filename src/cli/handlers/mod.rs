//! One handler per subcommand.

mod migrate;
mod serve;
mod sitemap;
mod watch;

pub use migrate::MigrateCommandHandler;
pub use serve::ServeCommandHandler;
pub use sitemap::SitemapCommandHandler;
pub use watch::WatchCommandHandler;
