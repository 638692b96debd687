use std::error::Error as _;
use std::fs;
use std::path::PathBuf;

use clap::Parser;
use hippovol::pipeline::{MeasurementOutcome, PipelineError, locate_structures, measure_structures};
use hippovol::report::{
    ReportError, StructureVolume, Summary, append_record, record_line, save_render, write_summary,
};
use hippovol::services::{ConversionService, Fsl, Segmentation, SegmentationService};
use hippovol::study::StudyInfo;
use hippovol::{Orientation, Pipeline, PipelineConfig, VolumeMeasurement};
use tracing::{Level, error, info, warn};
use web_time::Instant;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Hippocampal volumetry and labelled slice extraction",
    long_about = None
)]
struct Args {
    /// The DICOM directory
    #[arg(short = 'f', long = "dicomdir")]
    dicomdir: PathBuf,

    /// The output directory
    #[arg(short = 'o', long = "output")]
    output: PathBuf,

    /// Only render one orientation: sagittal, coronal or axial
    #[arg(short = 'd', long = "orientation")]
    orientation: Option<Orientation>,

    /// Anatomical NIfTI volume; skips conversion and segmentation
    #[arg(long, requires = "labels")]
    anatomical: Option<PathBuf>,

    /// Label NIfTI volume co-registered with --anatomical
    #[arg(long, requires = "anatomical")]
    labels: Option<PathBuf>,

    /// JSON file overriding the default pipeline configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the FSL executables
    #[arg(long)]
    fsl_bin: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    if let Err(e) = tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(level)
            .finish(),
    ) {
        eprintln!("[ERROR] could not set up logging: {e}");
    }

    run(args).unwrap_or_else(|e| {
        let mut message = e.to_string();
        let mut source = e.source();
        while let Some(cause) = source {
            message.push_str(&format!(": {cause}"));
            source = cause.source();
        }
        error!("{message}");
        std::process::exit(-1);
    });
}

fn run(args: Args) -> Result<(), PipelineError> {
    let start = Instant::now();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(orientation) = args.orientation {
        config.orientations = vec![orientation];
    }

    let study = StudyInfo::from_directory(&args.dicomdir)?;
    info!(accession = %study.accession_number, patient_id = %study.patient_id, "read study");

    fs::create_dir_all(&args.output).map_err(|source| ReportError::Io {
        path: args.output.clone(),
        source,
    })?;

    let fsl = Fsl::new(args.fsl_bin.clone());
    let segmentation = match (args.anatomical, args.labels) {
        (Some(anatomical), Some(labels)) => Segmentation { anatomical, labels },
        _ => {
            let work_dir = args.output.join("work");
            let anatomical = fsl.convert(&args.dicomdir, &work_dir)?;
            fsl.segment(&anatomical, &work_dir)?
        }
    };

    let table = locate_structures(&fsl, &segmentation.labels, &config)?;

    let record_path = args.output.join(&config.record_file);
    let (left_name, right_name) = config.record_pair.clone();
    let pipeline = Pipeline::open(&segmentation, config)?;
    let measurements = measure_structures(
        &fsl,
        &segmentation.labels,
        pipeline.config(),
        pipeline.voxel_volume_mm3(),
    );

    let mut images = Vec::new();
    for outcome in pipeline.render_all(&table) {
        let Ok(image) = outcome.result else { continue };
        match save_render(&args.output, &outcome.structure, outcome.orientation, &image) {
            Ok(path) => images.push(path),
            Err(e) => warn!(
                structure = %outcome.structure,
                orientation = %outcome.orientation,
                "{e}"
            ),
        }
    }

    match (
        measured(&measurements, &left_name),
        measured(&measurements, &right_name),
    ) {
        (Some(left), Some(right)) => {
            let line = record_line(&study.accession_number, left, right);
            append_record(&record_path, &line)?;
            info!(
                %left_name,
                left = %left.display_cm3(),
                %right_name,
                right = %right.display_cm3(),
                "volumes (cm3)"
            );
        }
        _ => error!(%left_name, %right_name, "volume record not written: measurement missing"),
    }

    let volumes = measurements
        .iter()
        .filter_map(|m| {
            m.result.as_ref().ok().map(|v| StructureVolume {
                structure: &m.structure,
                voxel_count: v.voxel_count,
                volume_cm3: v.cm3(),
            })
        })
        .collect();
    write_summary(
        &args.output.join("summary.json"),
        &Summary {
            study: &study,
            centroids: &table,
            volumes,
            images,
        },
    )?;

    info!("Time elapsed {:?}", start.elapsed());
    Ok(())
}

fn measured<'a>(
    measurements: &'a [MeasurementOutcome],
    name: &str,
) -> Option<&'a VolumeMeasurement> {
    measurements
        .iter()
        .find(|m| m.structure == name)
        .and_then(|m| m.result.as_ref().ok())
}
