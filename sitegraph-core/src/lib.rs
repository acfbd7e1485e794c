pub mod crawl;
pub mod report;

use colored::Colorize;

pub fn print_banner() {
    let banner = r#"
          _ __                                 __
   _____ (_) /_ ___   ____ _ _____ ____ _ ____  / /_
  / ___// / __// _ \ / __ `// ___// __ `// __ \/ __ \
 (__  )/ / /_ /  __// /_/ // /   / /_/ // /_/ / / / /
/____//_/\__/ \___/ \__, //_/    \__,_// .___/_/ /_/
                   /____/             /_/
"#;
    println!("{}", banner.bright_cyan());
    println!(
        "{}",
        format!(
            "  v{} - maps a website's link structure into a crawl graph",
            env!("CARGO_PKG_VERSION")
        )
        .bright_blue()
    );
    println!();
}
