// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kubernetes-backed [`Orchestrator`]: Worker Jobs as `batch/v1` Jobs, scratch
//! volumes as `PersistentVolumeClaim`s cascade-owned by the Job.

use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::{
    Container, EnvVar, PersistentVolumeClaim, PersistentVolumeClaimSpec, PersistentVolumeClaimVolumeSource,
    PodSpec, PodTemplateSpec, ResourceRequirements, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::Client;
use mb_core::{JobLabels, WorkerJobSpec, APP_LABEL_VALUE, JOB_ACTIVE_DEADLINE, JOB_TTL_AFTER_FINISHED};

use crate::error::OrchestratorError;
use crate::orchestrator::{JobPhase, JobStatusInfo, Orchestrator};

const SCRATCH_VOLUME_SIZE: &str = "20Gi";

#[derive(Clone)]
pub struct KubernetesOrchestrator {
    client: Client,
}

impl KubernetesOrchestrator {
    pub async fn connect() -> Result<Self, OrchestratorError> {
        let client = Client::try_default()
            .await
            .map_err(|e| OrchestratorError::Unavailable(e.to_string()))?;
        Ok(Self { client })
    }

    fn jobs(&self, namespace: &str) -> Api<Job> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn pvcs(&self, namespace: &str) -> Api<PersistentVolumeClaim> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl Orchestrator for KubernetesOrchestrator {
    async fn find_non_terminal_job(
        &self,
        namespace: &str,
        labels: &JobLabels,
    ) -> Result<Option<JobStatusInfo>, OrchestratorError> {
        let jobs = self.jobs(namespace);
        let params = ListParams::default().labels(&labels.selector());
        let list = jobs.list(&params).await.map_err(|e| OrchestratorError::Unavailable(e.to_string()))?;

        for job in list.items {
            let phase = job_phase(&job);
            if !phase.is_terminal() {
                let name = job.metadata.name.clone().unwrap_or_default();
                return Ok(Some(JobStatusInfo { name, phase }));
            }
        }
        Ok(None)
    }

    async fn ensure_scratch_volume(&self, spec: &WorkerJobSpec) -> Result<(), OrchestratorError> {
        let pvcs = self.pvcs(&spec.namespace);
        let name = spec.scratch_volume_name();

        if pvcs.get_opt(&name).await.map_err(|e| OrchestratorError::Unavailable(e.to_string()))?.is_some() {
            pvcs.delete(&name, &DeleteParams::default())
                .await
                .map_err(|e| OrchestratorError::ApiRejected(e.to_string()))?;
        }

        let pvc = PersistentVolumeClaim {
            metadata: ObjectMeta {
                name: Some(name),
                namespace: Some(spec.namespace.clone()),
                labels: Some(spec.labels.as_map()),
                ..Default::default()
            },
            spec: Some(PersistentVolumeClaimSpec {
                access_modes: Some(vec!["ReadWriteOnce".to_string()]),
                resources: Some(k8s_openapi::api::core::v1::VolumeResourceRequirements {
                    requests: Some(BTreeMap::from([(
                        "storage".to_string(),
                        Quantity(SCRATCH_VOLUME_SIZE.to_string()),
                    )])),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        pvcs.create(&PostParams::default(), &pvc)
            .await
            .map_err(|e| OrchestratorError::ApiRejected(e.to_string()))?;
        Ok(())
    }

    async fn create_job(&self, spec: &WorkerJobSpec) -> Result<(), OrchestratorError> {
        let job = build_job(spec);
        self.jobs(&spec.namespace)
            .create(&PostParams::default(), &job)
            .await
            .map_err(|e| OrchestratorError::ApiRejected(e.to_string()))?;
        Ok(())
    }

    async fn set_volume_owner(&self, spec: &WorkerJobSpec) -> Result<(), OrchestratorError> {
        let jobs = self.jobs(&spec.namespace);
        let job = jobs
            .get(spec.job_name.as_str())
            .await
            .map_err(|e| OrchestratorError::Unavailable(e.to_string()))?;
        let Some(uid) = job.metadata.uid.clone() else {
            return Err(OrchestratorError::Unavailable("created job has no uid yet".to_string()));
        };

        let owner = OwnerReference {
            api_version: "batch/v1".to_string(),
            kind: "Job".to_string(),
            name: spec.job_name.to_string(),
            uid,
            controller: Some(true),
            block_owner_deletion: Some(true),
        };

        let patch = serde_json::json!({
            "metadata": { "ownerReferences": [owner] }
        });
        self.pvcs(&spec.namespace)
            .patch(
                &spec.scratch_volume_name(),
                &PatchParams::default(),
                &Patch::Merge(&patch),
            )
            .await
            .map_err(|e| OrchestratorError::ApiRejected(e.to_string()))?;
        Ok(())
    }

    async fn get_job_phase(
        &self,
        namespace: &str,
        job_name: &str,
    ) -> Result<Option<JobPhase>, OrchestratorError> {
        match self.jobs(namespace).get_opt(job_name).await {
            Ok(Some(job)) => Ok(Some(job_phase(&job))),
            Ok(None) => Ok(None),
            Err(e) => Err(OrchestratorError::Unavailable(e.to_string())),
        }
    }
}

fn job_phase(job: &Job) -> JobPhase {
    let status = job.status.as_ref();
    let succeeded = status.and_then(|s| s.succeeded).unwrap_or(0) > 0;
    let failed = status.and_then(|s| s.failed).unwrap_or(0) > 0;
    if succeeded {
        JobPhase::Succeeded
    } else if failed {
        JobPhase::Failed
    } else {
        JobPhase::Active
    }
}

fn build_job(spec: &WorkerJobSpec) -> Job {
    let env: Vec<EnvVar> = spec
        .env
        .iter()
        .map(|(k, v)| EnvVar { name: k.clone(), value: Some(v.clone()), ..Default::default() })
        .collect();

    let scratch_mount = "/scratch".to_string();
    let volume_name = "scratch".to_string();

    let container = Container {
        name: "worker".to_string(),
        image: Some(spec.meeting_bot_image.clone()),
        env: Some(env),
        resources: Some(ResourceRequirements {
            requests: Some(BTreeMap::from([
                ("cpu".to_string(), Quantity(spec.resources.cpu.clone())),
                ("memory".to_string(), Quantity(spec.resources.memory.clone())),
            ])),
            ..Default::default()
        }),
        volume_mounts: Some(vec![VolumeMount {
            name: volume_name.clone(),
            mount_path: scratch_mount,
            ..Default::default()
        }]),
        ..Default::default()
    };

    let pod_spec = PodSpec {
        containers: vec![container],
        restart_policy: Some("Never".to_string()),
        service_account_name: spec.service_account.clone(),
        volumes: Some(vec![Volume {
            name: volume_name,
            persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                claim_name: spec.scratch_volume_name(),
                ..Default::default()
            }),
            ..Default::default()
        }]),
        ..Default::default()
    };

    Job {
        metadata: ObjectMeta {
            name: Some(spec.job_name.to_string()),
            namespace: Some(spec.namespace.clone()),
            labels: Some({
                let mut labels = spec.labels.as_map();
                labels.insert("app".to_string(), APP_LABEL_VALUE.to_string());
                labels
            }),
            ..Default::default()
        },
        spec: Some(JobSpec {
            backoff_limit: Some(0),
            active_deadline_seconds: Some(JOB_ACTIVE_DEADLINE.as_secs() as i64),
            ttl_seconds_after_finished: Some(JOB_TTL_AFTER_FINISHED.as_secs() as i32),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta { labels: Some(spec.labels.as_map()), ..Default::default() }),
                spec: Some(pod_spec),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}
