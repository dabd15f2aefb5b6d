// src/pipeline/stage.rs

//! Catalogue of the jobs the functional pipeline submits.

use std::fmt;

use crate::config::model::Settings;
use crate::discovery::{ModalityFamily, ModalityRun};
use crate::job::{JobSpec, QueueClass};
use crate::submit::render::quote;
use crate::subject::SubjectLayout;

/// Subdirectory of the binary directory holding the functional tools.
const FUNCTIONAL_TOOLS: &str = "bb_functional_pipeline";

/// One kind of job in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Structural postprocessing the functional branches build on.
    Postprocess,
    /// Gradient-echo field map preparation.
    FieldMap,
    PrepareRest,
    /// FEAT analysis of a resting-state run.
    FeatRest,
    /// FIX denoising.
    Fix,
    /// Functional connectivity from a parcellation.
    Connectivity,
    /// Clean up the FIX logs; terminal job of a resting-state chain.
    CleanLogs,
    PrepareTask,
    /// FEAT analysis of a task run; terminal job of a task chain.
    FeatTask,
    /// Imaging-derived phenotypes.
    Idp,
}

impl Stage {
    pub fn queue_class(self) -> QueueClass {
        match self {
            Stage::FeatRest | Stage::FeatTask => QueueClass::HighMemory,
            Stage::Fix => QueueClass::MaxMemory,
            _ => QueueClass::Standard,
        }
    }

    /// Family whose runs this stage is repeated for, if any.
    pub fn family(self) -> Option<ModalityFamily> {
        match self {
            Stage::PrepareRest
            | Stage::FeatRest
            | Stage::Fix
            | Stage::Connectivity
            | Stage::CleanLogs => Some(ModalityFamily::RestingState),
            Stage::PrepareTask | Stage::FeatTask => Some(ModalityFamily::Task),
            Stage::Postprocess | Stage::FieldMap | Stage::Idp => None,
        }
    }

    fn name_prefix(self) -> &'static str {
        match self {
            Stage::Postprocess => "bb_postprocess_struct",
            Stage::FieldMap => "tvb_prepare_gradEchoFieldMap",
            Stage::PrepareRest => "bb_prepare_rfMRI",
            Stage::FeatRest => "bb_feat_rfMRI_ns",
            Stage::Fix => "bb_fix",
            Stage::Connectivity => "bb_FC",
            Stage::CleanLogs => "bb_rfMRI_clean",
            Stage::PrepareTask => "bb_prepare_tfMRI",
            Stage::FeatTask => "bb_feat_tfMRI",
            Stage::Idp => "bb_IDP",
        }
    }

    /// Job name: `<prefix>[_<position>]_<subject suffix>`.
    pub fn job_name(self, position: Option<usize>, subject_suffix: &str) -> String {
        match position {
            Some(i) => format!("{}_{i}_{subject_suffix}", self.name_prefix()),
            None => format!("{}_{subject_suffix}", self.name_prefix()),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name_prefix())
    }
}

/// A run together with its position in discovery order.
#[derive(Debug, Clone, Copy)]
pub struct RunSlot<'r> {
    pub position: usize,
    pub run: &'r ModalityRun,
}

/// Everything a stage needs to turn itself into a [`JobSpec`].
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    pub subject: &'a SubjectLayout,
    pub settings: &'a Settings,
}

impl<'a> StageContext<'a> {
    pub fn new(subject: &'a SubjectLayout, settings: &'a Settings) -> Self {
        Self { subject, settings }
    }

    /// Full job description for `stage`, optionally for one run.
    pub fn job(&self, stage: Stage, slot: Option<RunSlot<'_>>) -> JobSpec {
        let name = stage.job_name(slot.map(|s| s.position), &self.subject.job_suffix());
        let queue_class = stage.queue_class();
        JobSpec {
            command: self.command(stage, slot),
            queue_class,
            memory_request_mb: self.settings.memory_request_mb(queue_class),
            log_path: self.subject.job_log_path(&name),
            name,
        }
    }

    fn command(&self, stage: Stage, slot: Option<RunSlot<'_>>) -> String {
        let subject = quote(self.subject.name());
        let index = slot.map(|s| quote(&s.run.index)).unwrap_or_default();
        let position = slot.map(|s| s.position).unwrap_or_default();

        match stage {
            Stage::Postprocess => self.tool("bb_postprocess_struct", &[&subject]),
            Stage::FieldMap => self.tool("tvb_prepare_gradEchoFieldMap", &[&subject]),
            Stage::PrepareRest => self.tool("bb_prepare_rfMRI", &[&subject, &index]),
            Stage::FeatRest => self.feat(&format!("rfMRI_{position}.fsf")),
            Stage::Fix => self.tool("bb_fix", &[&subject, &index]),
            Stage::Connectivity => self.tool("bb_FC", &[&subject, &index]),
            Stage::CleanLogs => self.tool("bb_clean_fix_logs", &[&subject, &index]),
            Stage::PrepareTask => self.tool("bb_prepare_tfMRI", &[&subject, &index]),
            Stage::FeatTask => self.feat(&format!("tfMRI_{position}.fsf")),
            Stage::Idp => format!("{}/bb_IDP/bb_IDP {subject}", self.settings.paths.bin_dir),
        }
    }

    fn tool(&self, binary: &str, args: &[&str]) -> String {
        let mut cmd = format!("{}/{FUNCTIONAL_TOOLS}/{binary}", self.settings.paths.bin_dir);
        for arg in args {
            cmd.push(' ');
            cmd.push_str(arg);
        }
        cmd
    }

    fn feat(&self, design_file: &str) -> String {
        let design = self.subject.fmri_dir().join(design_file);
        format!("feat {}", quote(&design.to_string_lossy()))
    }
}
