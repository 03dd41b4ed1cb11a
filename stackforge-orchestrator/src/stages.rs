//! Stage registry: the provisioning chain as data.
//!
//! Each non-terminal [`Stage`] has exactly one [`StageDescriptor`]: the
//! command it emits, the credential it cannot run without, and its successor.
//! `FINISHED` has no entry; reaching it is reported by [`crate::report`].

use stackforge_core::{platform, Stage};
use stackforge_renderer::{templates, Artifact, CommandTemplate};

/// Static description of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageDescriptor {
    pub stage: Stage,
    pub command: CommandTemplate,
    /// Credential that must be non-blank before the command is emitted.
    pub requires: Option<&'static str>,
    pub successor: Stage,
}

/// The chain, in order.
pub const STAGES: &[StageDescriptor] = &[
    StageDescriptor {
        stage: Stage::Init,
        command: CommandTemplate::new(templates::INIT, &[Artifact::EnvFile, Artifact::CloudKey]),
        requires: None,
        successor: Stage::ProvisionInfra,
    },
    StageDescriptor {
        stage: Stage::ProvisionInfra,
        command: CommandTemplate::new(templates::PROVISION_INFRA, &[]),
        requires: None,
        successor: Stage::ProvisionDataStore,
    },
    StageDescriptor {
        stage: Stage::ProvisionDataStore,
        command: CommandTemplate::new(templates::PROVISION_DATA_STORE, &[]),
        requires: None,
        successor: Stage::ProvisionBilling,
    },
    StageDescriptor {
        stage: Stage::ProvisionBilling,
        command: CommandTemplate::new(templates::PROVISION_BILLING, &[]),
        requires: None,
        successor: Stage::GenerateCode,
    },
    StageDescriptor {
        stage: Stage::GenerateCode,
        command: CommandTemplate::new(
            templates::GENERATE_CODE,
            &[
                Artifact::GitIgnore,
                Artifact::DataStoreClient,
                Artifact::HomePage,
                Artifact::DeployManifest,
            ],
        ),
        requires: None,
        successor: Stage::PublishSource,
    },
    StageDescriptor {
        stage: Stage::PublishSource,
        command: CommandTemplate::new(templates::PUBLISH_SOURCE, &[]),
        requires: Some(platform::SOURCE_CONTROL),
        successor: Stage::Deploy,
    },
    StageDescriptor {
        stage: Stage::Deploy,
        command: CommandTemplate::new(templates::DEPLOY, &[]),
        requires: None,
        successor: Stage::Finished,
    },
];

/// The descriptor for `stage`, or `None` for `FINISHED`.
pub fn lookup(stage: Stage) -> Option<&'static StageDescriptor> {
    STAGES.iter().find(|d| d.stage == stage)
}

/// Stages visited when following successors from `INIT`, terminal included.
pub fn chain() -> Vec<Stage> {
    let mut visited = vec![Stage::Init];
    let mut current = Stage::Init;
    while let Some(descriptor) = lookup(current) {
        current = descriptor.successor;
        if visited.contains(&current) {
            break;
        }
        visited.push(current);
    }
    visited
}
