use anyhow::{Context, Result};
use bip39kit::{Direction, Mnemonic, MnemonicInfo, Seed, Transformation, WordCount};
use console::{Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use rpassword::read_password;
use std::io::{self, BufRead, Write};
use std::time::{Duration, Instant};
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroizing;

pub const MAX_PHRASE_BYTES: usize = 4096;
pub const MAX_PASSWORD_BYTES: usize = 1024 * 1024;

pub const MIN_SAFE_PASSWORD_CHARS: usize = 12;
pub const PARANOID_WORD_COUNT: usize = 24;

pub struct DisplayOptions {
    pub unicode_support: bool,
    pub color_support: bool,
    pub quiet: bool,
}

impl DisplayOptions {
    pub fn detect(quiet: bool) -> Self {
        Self {
            unicode_support: detect_unicode_support(),
            color_support: detect_color_support(),
            quiet,
        }
    }

    fn style(&self, secure: bool) -> Style {
        if !self.color_support {
            Style::new()
        } else if secure {
            Style::new().green()
        } else {
            Style::new().yellow()
        }
    }

    fn status(&self, secure: bool) -> &'static str {
        let (ok, warn) = get_status_symbols(self.unicode_support);
        if secure { ok } else { warn }
    }

    fn branches(&self) -> (&'static str, &'static str) {
        if self.unicode_support {
            ("├─", "└─")
        } else {
            ("|-", "`-")
        }
    }
}

pub fn detect_unicode_support() -> bool {
    supports_unicode::on(supports_unicode::Stream::Stdout)
}

pub fn detect_color_support() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

pub fn get_status_symbols(unicode_support: bool) -> (&'static str, &'static str) {
    if unicode_support {
        ("✓", "!")
    } else {
        ("+", "!")
    }
}

fn validate_control_characters(s: &str, input_name: &str) -> Result<String> {
    let control_chars: Vec<(usize, char)> = s
        .chars()
        .enumerate()
        .filter(|(_, c)| c.is_control())
        .collect();

    if !control_chars.is_empty() {
        let term = Term::stderr();

        let warning_msg = format!(
            "WARNING: {} contains {} control character(s) at position(s): {}",
            input_name,
            control_chars.len(),
            control_chars
                .iter()
                .map(|(pos, _)| pos.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        term.write_line(&warning_msg)?;
        term.write_str("Continue anyway? [y/N]: ")?;
        term.flush()?;

        let mut response = String::new();
        io::stdin().read_line(&mut response)?;
        let response = response.trim().to_lowercase();

        term.clear_last_lines(2)?;

        if response != "y" && response != "yes" {
            anyhow::bail!("Aborted");
        }
    }

    Ok(s.to_string())
}

fn normalize_and_validate(s: &str, input_name: &str) -> Result<String> {
    let trimmed = s.trim();
    let normalized: String = trimmed.nfc().collect();
    validate_control_characters(&normalized, input_name)
}

/// Reads one mnemonic from stdin. Words may be separated by any whitespace.
pub fn prompt_mnemonic(label: &str) -> Result<Zeroizing<String>> {
    print!("{label}: ");
    io::stdout().flush()?;

    let mut input = Zeroizing::new(String::new());
    io::stdin()
        .lock()
        .read_line(&mut input)
        .with_context(|| format!("Failed to read {}", label.to_lowercase()))?;

    let phrase = Zeroizing::new(normalize_and_validate(&input, label)?);
    if phrase.is_empty() {
        anyhow::bail!("{label} cannot be empty");
    }
    if phrase.len() > MAX_PHRASE_BYTES {
        anyhow::bail!(
            "{} too long ({} bytes, maximum is {})",
            label,
            phrase.len(),
            MAX_PHRASE_BYTES
        );
    }

    Ok(phrase)
}

fn read_secret(label: &str) -> Result<Zeroizing<String>> {
    print!("{label}: ");
    io::stdout().flush()?;

    let secret = Zeroizing::new(
        read_password().with_context(|| format!("Failed to fetch {}", label.to_lowercase()))?,
    );
    let normalized = Zeroizing::new(normalize_and_validate(&secret, label)?);

    if normalized.len() > MAX_PASSWORD_BYTES {
        anyhow::bail!(
            "{} too long ({} bytes, maximum is {})",
            label,
            normalized.len(),
            MAX_PASSWORD_BYTES
        );
    }

    Ok(normalized)
}

/// An empty answer means no password. With `confirm` the password is asked a
/// second time and both entries must match.
pub fn prompt_password(confirm: bool) -> Result<Option<Zeroizing<String>>> {
    let password = read_secret("Password (empty for none)")?;
    if password.is_empty() {
        return Ok(None);
    }

    if confirm {
        let repeated = read_secret("Repeat password")?;
        if *repeated != *password {
            anyhow::bail!("Passwords do not match");
        }
    }

    Ok(Some(password))
}

pub fn prompt_passphrase() -> Result<Zeroizing<String>> {
    read_secret("Passphrase (empty for none)")
}

pub fn show_progress<F, T>(options: &DisplayOptions, message: &str, f: F) -> Result<(T, Duration)>
where
    F: FnOnce() -> Result<T>,
{
    if options.quiet {
        let start = Instant::now();
        return f().map(|r| (r, start.elapsed()));
    }

    println!();

    let term = Term::stdout();
    term.hide_cursor().ok();

    let pb = ProgressBar::new_spinner();

    if options.unicode_support {
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&[
                    "⠁", "⠂", "⠄", "⡀", "⡈", "⡐", "⡠", "⣀", "⣁", "⣂", "⣄", "⣌", "⣔", "⣤", "⣥", "⣦",
                    "⣮", "⣶", "⣷", "⣿", "⡿", "⠿", "⢟", "⠟", "⡛", "⠛", "⠫", "⢋", "⠋", "⠍", "⡉", "⠉",
                    "⠑", "⠡", "⢁", "⠁",
                ]),
        );
    } else {
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("-\\|/-"),
        );
    }

    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));

    let start = Instant::now();
    let result = f();
    let elapsed = start.elapsed();

    pb.finish_and_clear();
    term.show_cursor().ok();

    result.map(|r| (r, elapsed))
}

fn plural(count: usize, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 { one } else { many }
}

fn strength_label(words: WordCount) -> &'static str {
    if words.words() >= PARANOID_WORD_COUNT {
        "Paranoid"
    } else {
        "Strong"
    }
}

pub fn display_mnemonic(index: usize, mnemonic: &Mnemonic, options: &DisplayOptions) {
    if options.quiet {
        println!("{}", &*mnemonic.phrase());
        return;
    }

    println!("Out[{}]:\n{}\n", index, &*mnemonic.phrase());

    let words = mnemonic.word_count();
    let style = options.style(true);
    let (branch, last) = options.branches();

    println!("Stats:");
    println!(
        "  {} Entropy    {} bits ({})",
        branch,
        style.apply_to(words.entropy_bits()),
        style.apply_to(strength_label(words))
    );
    println!(
        "  {} Checksum   {} {}",
        branch,
        words.checksum_bits(),
        plural(words.checksum_bits(), "bit", "bits")
    );
    println!(
        "  {} Words      {} {}",
        last,
        words.words(),
        plural(words.words(), "word", "words")
    );
    println!();
}

pub fn display_info(info: &MnemonicInfo, options: &DisplayOptions) {
    if options.quiet {
        print!("{info}");
        return;
    }

    let (branch, last) = options.branches();
    let key = Style::new().dim();

    println!("Info:");
    println!("  {} Entropy    {}", branch, key.apply_to(&info.entropy));
    println!("  {} Checksum   {}", branch, key.apply_to(&info.checksum));
    println!("  {} Words", last);
    for (position, word) in &info.words {
        println!("       {position:>2}  {word}");
    }
    println!();
}

pub fn display_checksum_fixed(original: &str, fixed: &Mnemonic, options: &DisplayOptions) {
    let (_, warn) = get_status_symbols(options.unicode_support);
    let style = options.style(false);

    let obtained = original.split_whitespace().last().unwrap_or_default();
    let words = fixed.words();
    let expected = words.last().copied().unwrap_or_default();

    eprintln!(
        "{} Checksum fixed: last word {} -> {}",
        style.apply_to(format!("[{}]", warn)),
        obtained,
        style.apply_to(expected)
    );
}

pub fn display_valid(options: &DisplayOptions) {
    if options.quiet {
        return;
    }

    let (ok, _) = get_status_symbols(options.unicode_support);
    let style = options.style(true);
    println!(
        "{} {}",
        style.apply_to(format!("[{}]", ok)),
        style.apply_to("Valid mnemonic")
    );
}

pub fn display_transformation(transformation: Transformation, options: &DisplayOptions) {
    if options.quiet {
        return;
    }

    let (_, last) = options.branches();
    println!("Transformation:");
    println!(
        "  {} {:<10} {}",
        last,
        transformation.name(),
        transformation.description()
    );
    println!();
}

pub fn display_seed(seed: &Seed, elapsed: Duration, options: &DisplayOptions) {
    if options.quiet {
        println!("{}", &*seed.to_hex());
        return;
    }

    let (branch, last) = options.branches();
    println!("Out[0]:\n{}\n", &*seed.to_hex());
    println!("Stats:");
    println!("  {} KDF        PBKDF2-HMAC-SHA512 (2048 iterations)", branch);
    println!("  {} Length     {} bytes", branch, seed.as_bytes().len());
    println!("  {} Time       {:.1}s", last, elapsed.as_secs_f64());
}

pub struct CarrierReport {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub capacity: usize,
    pub used: usize,
    pub direction: Direction,
    pub encrypted: bool,
}

pub fn display_carrier(report: &CarrierReport, elapsed: Duration, options: &DisplayOptions) {
    if options.quiet {
        return;
    }

    let (branch, last) = options.branches();
    let style = options.style(report.encrypted);
    let protection = if report.encrypted {
        "Argon2id + ChaCha20-Poly1305"
    } else {
        "none"
    };

    println!("Carrier:");
    println!(
        "  {} Image      {}x{} ({} {})",
        branch,
        report.width,
        report.height,
        report.channels,
        plural(report.channels as usize, "channel", "channels")
    );
    println!(
        "  {} Capacity   {} of {} bits ({:.2}%)",
        branch,
        report.used,
        report.capacity,
        report.used as f64 * 100.0 / report.capacity.max(1) as f64
    );
    println!(
        "  {} Direction  {} ({})",
        branch,
        report.direction,
        report.direction.description()
    );
    println!(
        "  {} Password   {} {}",
        branch,
        style.apply_to(format!("[{}]", options.status(report.encrypted))),
        style.apply_to(protection)
    );
    println!("  {} Time       {:.1}s", last, elapsed.as_secs_f64());
    println!();
}

pub fn password_strength_hint(password: &str, options: &DisplayOptions) {
    if options.quiet {
        return;
    }

    let chars = password.chars().count();
    if chars < MIN_SAFE_PASSWORD_CHARS {
        let (_, warn) = get_status_symbols(options.unicode_support);
        eprintln!(
            "{} Password is short ({} {}, {} recommended)",
            options.style(false).apply_to(format!("[{}]", warn)),
            chars,
            plural(chars, "char", "chars"),
            MIN_SAFE_PASSWORD_CHARS
        );
    }
}
