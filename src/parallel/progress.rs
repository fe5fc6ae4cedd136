use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Phases of a scan, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgressSection {
    Prepare,
    Scan,
    GenerateReport,
}

impl ProgressSection {
    pub const ALL: [ProgressSection; 3] = [
        ProgressSection::Prepare,
        ProgressSection::Scan,
        ProgressSection::GenerateReport,
    ];

    fn index(self) -> usize {
        match self {
            ProgressSection::Prepare => 0,
            ProgressSection::Scan => 1,
            ProgressSection::GenerateReport => 2,
        }
    }

    /// Share of the overall bar, in percent
    pub fn weight(self) -> u64 {
        match self {
            ProgressSection::Prepare => 10,
            ProgressSection::Scan => 80,
            ProgressSection::GenerateReport => 10,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProgressSection::Prepare => "Preparing",
            ProgressSection::Scan => "Scanning",
            ProgressSection::GenerateReport => "Generating report",
        }
    }
}

/// Section-based progress sink. Every method takes `&self` and must tolerate concurrent calls.
pub trait ProgressReporter: Send + Sync {
    /// Set the number of steps expected in `section`
    fn set_section_length(&self, section: ProgressSection, length: usize);

    /// Record one completed step in `section`
    fn update(&self, section: ProgressSection);

    fn finish(&self) {}
}

#[derive(Debug, Default, Clone, Copy)]
struct SectionState {
    length: usize,
    done: usize,
}

/// Single weighted indicatif bar spanning all sections
pub struct ScanProgressBar {
    bar: ProgressBar,
    sections: Mutex<[SectionState; 3]>,
}

impl ScanProgressBar {
    const TOTAL_UNITS: u64 = 100;

    pub fn new() -> Self {
        Self::with_bar(ProgressBar::new(Self::TOTAL_UNITS))
    }

    /// Bar that renders nothing
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        bar.set_length(Self::TOTAL_UNITS);
        let style = ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] {bar:40.cyan/blue} {percent:>3}% {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");
        bar.set_style(style);
        bar.set_message(ProgressSection::Prepare.label());

        Self {
            bar,
            sections: Mutex::new([SectionState::default(); 3]),
        }
    }

    /// Weighted position for the current section states.
    ///
    /// Earlier sections count as complete once a later section has any length.
    fn position(sections: &[SectionState; 3]) -> u64 {
        let mut position = 0;
        for section in ProgressSection::ALL {
            let state = sections[section.index()];
            let started_later = ProgressSection::ALL
                .iter()
                .filter(|later| later.index() > section.index())
                .any(|later| sections[later.index()].length > 0);

            position += if started_later || (state.length > 0 && state.done >= state.length) {
                section.weight()
            } else if state.length > 0 {
                section.weight() * state.done as u64 / state.length as u64
            } else {
                0
            };
        }
        position.min(Self::TOTAL_UNITS)
    }

    pub fn position_units(&self) -> u64 {
        self.bar.position()
    }
}

impl Default for ScanProgressBar {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ScanProgressBar {
    fn set_section_length(&self, section: ProgressSection, length: usize) {
        if let Ok(mut sections) = self.sections.lock() {
            sections[section.index()] = SectionState { length, done: 0 };
            self.bar.set_position(Self::position(&sections));
            self.bar.set_message(section.label());
        }
    }

    fn update(&self, section: ProgressSection) {
        if let Ok(mut sections) = self.sections.lock() {
            sections[section.index()].done += 1;
            self.bar.set_position(Self::position(&sections));
        }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

/// Atomic per-section counters without rendering
#[derive(Debug, Default)]
pub struct CountingProgress {
    lengths: [AtomicUsize; 3],
    updates: [AtomicUsize; 3],
}

impl CountingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section_length(&self, section: ProgressSection) -> usize {
        self.lengths[section.index()].load(Ordering::Relaxed)
    }

    pub fn updates(&self, section: ProgressSection) -> usize {
        self.updates[section.index()].load(Ordering::Relaxed)
    }
}

impl ProgressReporter for CountingProgress {
    fn set_section_length(&self, section: ProgressSection, length: usize) {
        self.lengths[section.index()].store(length, Ordering::Relaxed);
    }

    fn update(&self, section: ProgressSection) {
        self.updates[section.index()].fetch_add(1, Ordering::Relaxed);
    }
}
