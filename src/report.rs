use crate::{ConfigurationPhases, PhaseError, PipelineConfig, Result, mean};
use cli_table::{Cell, Table, TableStruct};
use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, io::Write, path::Path};

/// Everything one invocation produced, written once the whole pipeline succeeded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Task name, e.g. canneal
    pub task: String,
    /// Pipeline parameters used
    pub config: PipelineConfig,
    /// Per-configuration phases, in configuration order
    pub configurations: Vec<ConfigurationPhases>,
}

impl AnalysisResult {
    /// Write pretty json. The file only appears once it is complete.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|err| PhaseError::io(dir, err))?;

        let content = serde_json::to_vec_pretty(self)
            .map_err(|err| PhaseError::io(path, std::io::Error::other(err)))?;
        let mut file =
            tempfile::NamedTempFile::new_in(dir).map_err(|err| PhaseError::io(dir, err))?;
        file.write_all(&content)
            .map_err(|err| PhaseError::io(file.path(), err))?;
        file.persist(path)
            .map_err(|err| PhaseError::io(path, err.error))?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<AnalysisResult> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| PhaseError::io(path, err))?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|err| PhaseError::io(path, std::io::Error::other(err)))
    }

    pub fn summary_table(&self) -> TableStruct {
        let mut table = vec![];
        for result in &self.configurations {
            let rates: Vec<f64> = result.phases.iter().map(|phase| phase.mean_rate).collect();
            table.push(vec![
                result.cache_size.cell(),
                result.configuration.mem_bw.cell(),
                result.sample_count.cell(),
                result.phases.len().cell(),
                format!("{:.4}", result.max_time).cell(),
                result.max_instructions.cell(),
                format!("{:.3e}", mean(&rates)).cell(),
            ]);
        }
        table.table().title(vec![
            "Cache".cell(),
            "Mem. BW".cell(),
            "# Samples".cell(),
            "# Phases".cell(),
            "Max time (s)".cell(),
            "Max insn.".cell(),
            "Avg. phase rate".cell(),
        ])
    }
}

pub fn phase_table(result: &ConfigurationPhases) -> TableStruct {
    let mut table = vec![];
    for (index, phase) in result.phases.iter().enumerate() {
        table.push(vec![
            (index + 1).cell(),
            phase.start_insn.cell(),
            phase.end_insn.cell(),
            phase.cluster_id.cell(),
            format!("{:.3e}", phase.mean_rate).cell(),
            format!("{:.3}", phase.coefficient_of_variation).cell(),
            format!("{:.1}", phase.mean_l3_req).cell(),
            format!("{:.1}", phase.mean_l3_miss).cell(),
        ]);
    }
    table.table().title(vec![
        "Phase".cell(),
        "Insn. start".cell(),
        "Insn. end".cell(),
        "Cluster".cell(),
        "Mean rate".cell(),
        "CV".cell(),
        "Mean L3 req.".cell(),
        "Mean L3 miss".cell(),
    ])
}
