//! CSV export of recorded frames and diagnostics.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::recording::recorder::{DiagnosticsSample, Frame};

/// One row per body per frame: `step,t,body,x,y,z`
pub fn write_frames_csv<W: Write>(frames: &[Frame], mut out: W) -> io::Result<()> {
    writeln!(out, "step,t,body,x,y,z")?;
    for frame in frames {
        for (i, p) in frame.positions.iter().enumerate() {
            writeln!(out, "{},{},{},{},{},{}", frame.step, frame.t, i, p.x, p.y, p.z)?;
        }
    }
    out.flush()
}

/// One row per sample: `step,t,kinetic,potential,total,drift,px,py,pz,lx,ly,lz`
pub fn write_diagnostics_csv<W: Write>(samples: &[DiagnosticsSample], mut out: W) -> io::Result<()> {
    writeln!(out, "step,t,kinetic,potential,total,drift,px,py,pz,lx,ly,lz")?;
    for s in samples {
        let d = &s.diagnostics;
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{}",
            s.step,
            d.t,
            d.kinetic,
            d.potential,
            d.total,
            s.energy_drift,
            d.momentum.x,
            d.momentum.y,
            d.momentum.z,
            d.angular_momentum.x,
            d.angular_momentum.y,
            d.angular_momentum.z,
        )?;
    }
    out.flush()
}

pub fn save_frames_csv(frames: &[Frame], path: &Path) -> io::Result<()> {
    write_frames_csv(frames, BufWriter::new(File::create(path)?))
}

pub fn save_diagnostics_csv(samples: &[DiagnosticsSample], path: &Path) -> io::Result<()> {
    write_diagnostics_csv(samples, BufWriter::new(File::create(path)?))
}
