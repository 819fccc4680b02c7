use planar_tracker::config::{load_config, DemoConfig};
use planar_tracker::image::io::{load_grayscale_image, save_grayscale_u8, write_json_file};
use planar_tracker::image::{ImageFrame, GrayImageU8};
use planar_tracker::{overlay, CycleInput, CycleReport, TrackedRegion, TrackingSession};
use serde::Serialize;
use std::env;
use std::path::Path;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FrameRecord {
    frame: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<TrackedRegion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quad: Option<[f32; 8]>,
    report: CycleReport,
}

fn usage(program: &str) -> String {
    format!("Usage: {program} <config.json>")
}

fn run() -> Result<(), String> {
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "track_demo".to_string());
    let config_path = args.next().ok_or_else(|| usage(&program))?;
    let config = load_config(Path::new(&config_path)).map_err(|e| e.to_string())?;

    let template = load_grayscale_image(&config.template)
        .map_err(|e| format!("Failed to load template {}: {e}", config.template.display()))?;
    let mut session = TrackingSession::new(config.tracker.clone()).map_err(|e| e.to_string())?;

    let records = track_frames(&config, &template, &mut session)?;
    print_summary(&records);

    if let Some(path) = &config.output.json_out {
        write_json_file(path, &records).map_err(|e| e.to_string())?;
        println!("\nJSON report written to {}", path.display());
    }
    Ok(())
}

fn track_frames(
    config: &DemoConfig,
    template: &GrayImageU8,
    session: &mut TrackingSession,
) -> Result<Vec<FrameRecord>, String> {
    let secondary = ImageFrame::gray(template.as_view());
    let mut records = Vec::with_capacity(config.frames.len());
    for (i, path) in config.frames.iter().enumerate() {
        let frame = load_grayscale_image(path)
            .map_err(|e| format!("Failed to load frame {}: {e}", path.display()))?;
        let primary = ImageFrame::gray(frame.as_view());
        let out = session.process(&CycleInput {
            primary,
            secondary,
            time_msec: i as i64 * config.frame_interval_ms,
        });
        if let Some(dir) = &config.output.overlay_dir {
            let composite = overlay(
                primary,
                secondary,
                out.transform.as_ref(),
                &config.output.overlay,
            );
            let target = dir.join(format!("overlay_{i:04}.png"));
            save_grayscale_u8(&composite.image, &target)
                .map_err(|e| format!("Failed to save {}: {e}", target.display()))?;
        }
        records.push(FrameRecord {
            frame: path.display().to_string(),
            quad: out.region.as_ref().map(TrackedRegion::to_floats),
            region: out.region,
            report: out.report,
        });
    }
    Ok(records)
}

fn print_summary(records: &[FrameRecord]) {
    println!("Tracking summary");
    for rec in records {
        let state = rec
            .report
            .state
            .map(|s| format!("{s:?}"))
            .unwrap_or_else(|| "-".to_string());
        match &rec.quad {
            Some(q) => println!(
                "  t={:>6}ms {:<12} quad=[{:.3} {:.3} | {:.3} {:.3} | {:.3} {:.3} | {:.3} {:.3}] total={:.2}ms",
                rec.report.time_msec,
                state,
                q[0],
                q[1],
                q[2],
                q[3],
                q[4],
                q[5],
                q[6],
                q[7],
                rec.report.timings.total_ms
            ),
            None => println!(
                "  t={:>6}ms {:<12} no region ({:?}) total={:.2}ms",
                rec.report.time_msec,
                state,
                rec.report.outcome.skip_reason(),
                rec.report.timings.total_ms
            ),
        }
    }
}
