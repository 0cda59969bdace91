mod daily_post;

pub use daily_post::DailyPostTask;
