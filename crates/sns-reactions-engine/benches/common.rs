// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_feed_markup(posts: usize) -> String {
    let mut content = String::from("The story continues while the feed reacts.\n\n");
    for i in 0..posts {
        content.push_str(&format!(
            "[POST]\nUser: @@user_{i}\nName: User {i}\nDate: {i}m\nContent: Post number {i}\nwith a second line\nMedia: [Image] photo {i} [Video] clip {i}\nStats: {i}.5K {i}R {i}Q\n[REPLIES]\nFan @fan_{i}: nice [1m]\n└ Other @other_{i}: agreed [30s]\nplain_nick: ok\n[/REPLIES]\n[QUOTES]\nCritic @critic_{i}: hmm\n[/QUOTES]\n[/POST]\n\n"
        ));
    }
    content
}

#[allow(dead_code)]
pub fn generate_verbose_markup(posts: usize) -> String {
    let mut content = String::new();
    for i in 0..posts {
        content.push_str(&format!(
            "[POST]\nUser: @user_{i}\nContent: verbose {i}\n[REPLIES]\nUser: @a_{i}\nName: A\nContent: first\nUser: @b_{i}\nName: Name\nContent: second\n[/REPLIES]\n[/POST]\n"
        ));
    }
    content
}
