use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use crossbeam_channel::{Receiver, RecvTimeoutError};

use micfilter::audio::{BufferSource, CaptureSource, DevicePlayback, DeviceSource, PlaybackSink};
use micfilter::commands::{Command, HELP};
use micfilter::config::{AppConfig, Cutoff};
use micfilter::output::{Formatter, OutputFormat, create_formatter};
use micfilter::{FilterError, Recorder, save_wav};

#[derive(Parser, Debug)]
#[command(name = "micfilter")]
#[command(about = "Record the microphone and band-filter it with allpass-based stages", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// High-pass cutoff (e.g. "200", "0.2khz")
    #[arg(long)]
    highpass: Option<Cutoff>,

    /// Low-pass cutoff (e.g. "1000", "1khz")
    #[arg(long)]
    lowpass: Option<Cutoff>,

    /// Capture sample rate in Hz
    #[arg(short = 'r', long)]
    sample_rate: Option<u32>,

    /// Replay a WAV file instead of capturing from the microphone
    #[arg(short = 'i', long)]
    input: Option<PathBuf>,

    /// Record once for this many seconds, report, and exit
    #[arg(short = 'd', long, value_parser = parse_duration)]
    duration: Option<Duration>,

    /// Summary format: text, json
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Directory for original.wav and filtered.wav
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

struct App {
    recorder: Recorder,
    playback: DevicePlayback,
    formatter: Box<dyn Formatter>,
    save_dir: Option<PathBuf>,
    input_frames: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    if let Some(rate) = args.sample_rate {
        config.audio.sample_rate = rate;
    }
    if let Some(hp) = args.highpass {
        config.filter.highpass_cutoff = hp.as_hz();
    }
    if let Some(lp) = args.lowpass {
        config.filter.lowpass_cutoff = lp.as_hz();
    }
    config.validate()?;

    let (source, input_frames): (Box<dyn CaptureSource>, Option<usize>) = match &args.input {
        Some(path) => {
            let source = BufferSource::from_wav(path, config.audio.buffer_size)?;
            let frames = source.len();
            (Box::new(source), Some(frames))
        }
        None => (Box::new(DeviceSource::new(&config.audio)), None),
    };

    println!("=== Microphone Filter ===");
    println!("Sample rate: {} Hz", source.sample_rate());
    println!(
        "Band: {}-{} Hz",
        config.filter.highpass_cutoff, config.filter.lowpass_cutoff
    );
    println!();

    let mut app = App {
        recorder: Recorder::new(source, &config.filter),
        playback: DevicePlayback::new(),
        formatter: create_formatter(args.format, args.verbose > 0),
        save_dir: args.save_dir.clone(),
        input_frames,
    };

    match args.duration {
        Some(duration) => app.run_once(duration),
        None => app.run_interactive(spawn_stdin_reader()),
    }
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    let secs: f32 = s
        .trim()
        .parse()
        .map_err(|e| format!("invalid duration '{}': {}", s, e))?;
    Duration::try_from_secs_f32(secs).map_err(|e| format!("invalid duration '{}': {}", s, e))
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = crossbeam_channel::unbounded();
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::error!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

impl App {
    fn run_once(&mut self, duration: Duration) -> anyhow::Result<()> {
        let deadline = Instant::now()
            .checked_add(duration)
            .ok_or_else(|| anyhow::anyhow!("duration too long: {:?}", duration))?;
        self.recorder.start()?;
        while Instant::now() < deadline && !self.input_exhausted() {
            thread::sleep(Duration::from_millis(10));
        }
        self.stop_recording()
    }

    fn run_interactive(&mut self, lines: Receiver<String>) -> anyhow::Result<()> {
        println!("{}\n", HELP);
        self.start_recording()?;

        loop {
            let line = if self.recorder.is_recording() {
                match lines.recv_timeout(Duration::from_secs(1)) {
                    Ok(line) => line,
                    Err(RecvTimeoutError::Timeout) => {
                        if self.input_exhausted() {
                            self.stop_recording()?;
                        } else {
                            println!("Recording duration: {} s", self.recorder.elapsed().as_secs());
                        }
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => {
                        self.stop_recording()?;
                        return Ok(());
                    }
                }
            } else {
                match lines.recv() {
                    Ok(line) => line,
                    Err(_) => return Ok(()),
                }
            };

            let command = match line.parse::<Command>() {
                Ok(command) => command,
                Err(e) => {
                    eprintln!("{}", e);
                    continue;
                }
            };

            if command == Command::Quit {
                if self.recorder.is_recording() {
                    self.stop_recording()?;
                }
                self.playback.stop();
                return Ok(());
            }
            self.handle(command)?;
        }
    }

    fn handle(&mut self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::Record => self.start_recording()?,
            Command::Stop => {
                if self.recorder.is_recording() {
                    self.stop_recording()?;
                }
            }
            Command::PlayOriginal => {
                let result = self
                    .recorder
                    .raw_samples()
                    .and_then(|raw| self.playback.play(raw, self.recorder.sample_rate()));
                report(result);
            }
            Command::PlayFiltered => {
                let result = self
                    .recorder
                    .filtered_samples()
                    .and_then(|filtered| self.playback.play(filtered, self.recorder.sample_rate()));
                report(result);
            }
            Command::SetHighpass(cutoff) => {
                let hz = self.recorder.cutoffs().set_highpass(cutoff.as_hz());
                println!("High-pass cutoff: {} Hz", hz);
            }
            Command::SetLowpass(cutoff) => {
                let hz = self.recorder.cutoffs().set_lowpass(cutoff.as_hz());
                println!("Low-pass cutoff: {} Hz", hz);
            }
            Command::Refilter => {
                let result = self.recorder.refilter();
                if result.is_ok() {
                    self.print_summary();
                }
                report(result);
            }
            Command::Info => self.print_summary(),
            Command::Save => match &self.save_dir {
                Some(dir) => report(self.save(dir)),
                None => eprintln!("No save directory configured (use --save-dir)"),
            },
            Command::Help => println!("{}", HELP),
            Command::Quit => {}
        }
        Ok(())
    }

    fn start_recording(&mut self) -> anyhow::Result<()> {
        match self.recorder.start() {
            Ok(()) => {
                println!("Recording... press Enter to stop.");
                Ok(())
            }
            Err(FilterError::AlreadyRecording) => {
                eprintln!("Already recording");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn stop_recording(&mut self) -> anyhow::Result<()> {
        match self.recorder.stop() {
            Ok(()) => {
                self.print_summary();
                if let Some(dir) = self.save_dir.clone() {
                    report(self.save(&dir));
                }
                Ok(())
            }
            Err(e @ (FilterError::NoAudioRecorded | FilterError::NotRecording)) => {
                eprintln!("Error: {}", e);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn print_summary(&self) {
        match self.recorder.summary() {
            Ok(summary) => println!("{}", self.formatter.format(&summary)),
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    fn save(&self, dir: &Path) -> micfilter::Result<()> {
        let raw = self.recorder.raw_samples()?;
        let filtered = self.recorder.filtered_samples()?;
        let sample_rate = self.recorder.sample_rate();

        std::fs::create_dir_all(dir)?;
        let original_path = dir.join("original.wav");
        let filtered_path = dir.join("filtered.wav");
        save_wav(&original_path, raw, sample_rate)?;
        save_wav(&filtered_path, filtered, sample_rate)?;
        println!(
            "Saved {} and {}",
            original_path.display(),
            filtered_path.display()
        );
        Ok(())
    }

    fn input_exhausted(&self) -> bool {
        self.input_frames
            .is_some_and(|frames| self.recorder.captured_frames() >= frames)
    }
}

fn report(result: micfilter::Result<()>) {
    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("2.5"), Ok(Duration::from_millis(2500)));
        assert_eq!(parse_duration("0"), Ok(Duration::ZERO));
        assert!(parse_duration("inf").is_err());
        assert!(parse_duration("NaN").is_err());
        assert!(parse_duration("-1").is_err());
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn test_args_reject_infinite_duration() {
        assert!(Args::try_parse_from(["micfilter", "--duration", "inf"]).is_err());
        let args = Args::try_parse_from(["micfilter", "-d", "3"]).unwrap();
        assert_eq!(args.duration, Some(Duration::from_secs(3)));
    }
}
