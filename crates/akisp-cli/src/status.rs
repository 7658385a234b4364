// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::error::CliError;
use akisp::{
    diagnostics::{Diagnostics, Section},
    isp::{IspCore, VendorIsp},
};
use clap::Args as ClapArgs;
use serde::Serialize;
use std::sync::Arc;

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// ISP index to report on
    #[arg(short, long, default_value = "0")]
    index: String,

    /// Section to dump (isp_version, ae_run_info, frame_rate, af_stat_info,
    /// awb_stat_info, 3d_nr_stat_info_0_11, 3d_nr_stat_info_12_23, ae_attr);
    /// all sections when omitted
    #[arg(short, long)]
    section: Option<String>,
}

#[derive(Debug, Serialize)]
struct SectionReport {
    section: &'static str,
    text: String,
}

pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Executing status command: {:?}", args);

    let sections = match &args.section {
        Some(name) => vec![name
            .parse::<Section>()
            .map_err(|_| CliError::InvalidArgs(format!("unknown section: {}", name)))?],
        None => Section::ALL.to_vec(),
    };

    // statistics getters are process-wide and need no core handle; shown as input 0
    let isp = VendorIsp::load()?;
    let version = isp.version()?;
    log::debug!("ISP core version {}", version);
    let cores: Vec<Arc<dyn IspCore>> = vec![Arc::new(isp)];

    let diag = Diagnostics::new();
    diag.store_isp_index(&args.index);

    let reports: Vec<SectionReport> = sections
        .into_iter()
        .map(|section| SectionReport {
            section: section.name(),
            text: diag.show_cores(&cores, section),
        })
        .collect();

    if json {
        let json_str = serde_json::to_string_pretty(&reports)
            .map_err(|e| CliError::General(format!("Failed to serialize JSON: {}", e)))?;
        println!("{}", json_str);
    } else {
        for report in &reports {
            println!("[{}]", report.section);
            print!("{}", report.text);
        }
    }

    Ok(())
}
