// OcProbe: OpenConfig conformance probes written in Rust
// Copyright (C) 2022-2023 Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! QoS configuration: classifiers, input classifiers, forwarding groups, scheduler policies, ECN
//! queue management and output interfaces.
//!
//! Each case starts from an empty QoS tree and adds one element per step. After every step, the
//! whole tree replaces `/qos` on the DUT. No traffic is sent.

use ate_lab::{ConfigClient, TrafficDriver};
use oc_model::{
    Dscp, IpFamily, Path, QosBuilder, SchedulerInput, SchedulerPriority, WredUniform,
};

use super::{CaseReport, Testbed};
use crate::runtime::{Harness, HarnessError};

/// Name of the IPv4 classifier.
pub const CLASSIFIER_IPV4: &str = "dscp_based_classifier_ipv4";
/// Name of the IPv6 classifier.
pub const CLASSIFIER_IPV6: &str = "dscp_based_classifier_ipv6";
/// Name of the scheduler policy.
pub const SCHEDULER_POLICY: &str = "scheduler";
/// Name of the ECN queue management profile.
pub const ECN_PROFILE: &str = "DropProfile";

/// Queues with the DSCP values classified into them, in the order of the classifier terms.
pub static QUEUES: [(&str, &[u8]); 7] = [
    ("BE1", &[0, 1, 2, 3]),
    ("BE0", &[4, 5, 6, 7]),
    ("AF1", &[8, 9, 10, 11]),
    ("AF2", &[16, 17, 18, 19]),
    ("AF3", &[24, 25, 26, 27]),
    ("AF4", &[32, 33, 34, 35]),
    ("NC1", &[48, 49, 50, 51, 52, 53, 54, 55, 56, 57, 58, 59]),
];

/// Sequence, priority and weight of the scheduler input of each queue.
const SCHEDULERS: [(&str, u32, Option<SchedulerPriority>, u64); 7] = [
    ("BE1", 1, None, 1),
    ("BE0", 1, None, 2),
    ("AF1", 1, None, 4),
    ("AF2", 1, None, 8),
    ("AF3", 1, None, 16),
    ("AF4", 0, Some(SchedulerPriority::Strict), 100),
    ("NC1", 0, Some(SchedulerPriority::Strict), 200),
];

fn target_group(queue: &str) -> String {
    format!("target-group-{queue}")
}

/// A single change to the QoS tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QosStep {
    /// Add a term to a classifier.
    ClassifierTerm {
        /// Name of the classifier
        classifier: &'static str,
        /// Family of the classifier
        family: IpFamily,
        /// Id of the term
        term: String,
        /// Queue whose target group the term selects
        queue: &'static str,
        /// DSCP values matched by the term
        dscp: &'static [u8],
    },
    /// Attach a classifier to the input of DUT port1.
    InputClassifier {
        /// Family of the classifier
        family: IpFamily,
        /// Name of the classifier
        classifier: &'static str,
    },
    /// Add a forwarding group and its queue.
    ForwardingGroup {
        /// Name of the queue
        queue: &'static str,
    },
    /// Add an input to the scheduler policy.
    SchedulerInput {
        /// Sequence of the scheduler
        sequence: u32,
        /// Priority of the scheduler
        priority: Option<SchedulerPriority>,
        /// Name of the queue, also used as input id
        queue: &'static str,
        /// Weight of the input
        weight: u64,
    },
    /// Add the ECN queue management profile.
    QueueManagement {
        /// WRED parameters
        wred: WredUniform,
    },
    /// Add an output queue with the ECN profile to DUT port2, and set its scheduler policy.
    OutputQueue {
        /// Name of the queue
        queue: &'static str,
    },
}

impl QosStep {
    /// Short name of the step
    pub fn name(&self) -> String {
        match self {
            QosStep::ClassifierTerm {
                family, queue, ..
            } => format!("classifier_{}_{}", family, queue.to_lowercase()),
            QosStep::InputClassifier { family, .. } => {
                format!("Input Classifier Type {}", family.as_str().to_uppercase())
            }
            QosStep::ForwardingGroup { queue } => format!("forwarding-group-{queue}"),
            QosStep::SchedulerInput { queue, .. } => format!("scheduler-policy-{queue}"),
            QosStep::QueueManagement { .. } => format!("queue-management-{ECN_PROFILE}"),
            QosStep::OutputQueue { queue } => format!("output-interface-{queue}"),
        }
    }

    /// Apply the change to the tree.
    pub fn apply(&self, qos: &mut QosBuilder, testbed: &Testbed) -> Result<(), HarnessError> {
        match self {
            QosStep::ClassifierTerm {
                classifier,
                family,
                term,
                queue,
                dscp,
            } => {
                qos.classifier_term(
                    *classifier,
                    *family,
                    term.as_str(),
                    target_group(queue),
                    Dscp::set(dscp)?,
                )?;
            }
            QosStep::InputClassifier { family, classifier } => {
                qos.input_classifier(testbed.dut_port("port1")?, *family, *classifier);
            }
            QosStep::ForwardingGroup { queue } => {
                qos.forwarding_group(target_group(queue), *queue);
            }
            QosStep::SchedulerInput {
                sequence,
                priority,
                queue,
                weight,
            } => {
                qos.scheduler_input(
                    SCHEDULER_POLICY,
                    *sequence,
                    *priority,
                    SchedulerInput {
                        id: queue.to_string(),
                        queue: queue.to_string(),
                        weight: *weight,
                    },
                )?;
            }
            QosStep::QueueManagement { wred } => {
                qos.wred_profile(ECN_PROFILE, *wred)?;
            }
            QosStep::OutputQueue { queue } => {
                let port2 = testbed.dut_port("port2")?;
                qos.output_queue(port2, *queue, Some(ECN_PROFILE.to_string()))
                    .output_scheduler_policy(port2, SCHEDULER_POLICY);
            }
        }
        Ok(())
    }
}

/// A case of the suite: a sequence of steps on an initially empty QoS tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QosCase {
    /// Name of the case
    pub name: &'static str,
    /// What the case checks
    pub description: &'static str,
    /// The steps
    pub steps: Vec<QosStep>,
}

/// The ECN profile: mark instead of drop, starting at 80 kB.
pub fn ecn_profile() -> WredUniform {
    WredUniform {
        enable_ecn: true,
        drop: false,
        min_threshold: 80000,
        max_threshold: u64::MAX,
        max_drop_probability_percent: None,
        weight: None,
    }
}

/// All cases of the suite, in order.
pub fn cases() -> Vec<QosCase> {
    let classifier_terms = [
        (CLASSIFIER_IPV4, IpFamily::Ipv4),
        (CLASSIFIER_IPV6, IpFamily::Ipv6),
    ]
    .into_iter()
    .flat_map(|(classifier, family)| {
        QUEUES
            .iter()
            .enumerate()
            .map(move |(i, &(queue, dscp))| QosStep::ClassifierTerm {
                classifier,
                family,
                term: i.to_string(),
                queue,
                dscp,
            })
    })
    .collect();

    vec![
        QosCase {
            name: "qos classifier",
            description: "Configure DSCP based classifiers for IPv4 and IPv6.",
            steps: classifier_terms,
        },
        QosCase {
            name: "qos input interface classifier",
            description: "Attach the IPv4 and IPv6 classifiers to the input of port1.",
            steps: vec![
                QosStep::InputClassifier {
                    family: IpFamily::Ipv4,
                    classifier: CLASSIFIER_IPV4,
                },
                QosStep::InputClassifier {
                    family: IpFamily::Ipv6,
                    classifier: CLASSIFIER_IPV6,
                },
            ],
        },
        QosCase {
            name: "qos forwarding groups",
            description: "Configure one forwarding group and output queue per traffic class.",
            steps: QUEUES
                .iter()
                .map(|&(queue, _)| QosStep::ForwardingGroup { queue })
                .collect(),
        },
        QosCase {
            name: "qos scheduler policies",
            description: "Configure a strict priority scheduler for AF4 and NC1, and a weighted \
                          scheduler for the other queues.",
            steps: SCHEDULERS
                .iter()
                .map(|&(queue, sequence, priority, weight)| QosStep::SchedulerInput {
                    sequence,
                    priority,
                    queue,
                    weight,
                })
                .collect(),
        },
        QosCase {
            name: "qos ecn",
            description: "Configure a WRED queue management profile with ECN enabled.",
            steps: vec![QosStep::QueueManagement {
                wred: ecn_profile(),
            }],
        },
        QosCase {
            name: "qos output interface",
            description: "Attach every queue with the ECN profile, and the scheduler policy, to \
                          the output of port2.",
            steps: QUEUES
                .iter()
                .map(|&(queue, _)| QosStep::OutputQueue { queue })
                .collect(),
        },
    ]
}

pub(super) async fn run<D, A>(
    harness: &mut Harness<D, A>,
    testbed: &Testbed,
) -> Result<Vec<CaseReport>, HarnessError>
where
    D: ConfigClient,
    A: TrafficDriver,
{
    let mut reports = Vec::new();
    for case in cases() {
        log::info!("[{}] {}", case.name, case.description);
        let outcome = run_case(harness, testbed, &case).await;
        reports.push(CaseReport::conclude(
            case.name,
            case.description,
            outcome,
            Vec::new(),
        ));
    }
    Ok(reports)
}

/// Run a single case, replacing `/qos` after every step.
pub async fn run_case<D, A>(
    harness: &mut Harness<D, A>,
    testbed: &Testbed,
    case: &QosCase,
) -> Result<(), HarnessError>
where
    D: ConfigClient,
    A: TrafficDriver,
{
    let mut qos = QosBuilder::new();
    for step in case.steps.iter() {
        log::debug!("[{}] {}", case.name, step.name());
        step.apply(&mut qos, testbed)?;
        harness.replace(&Path::qos(), qos.snapshot().to_json()).await?;
    }
    Ok(())
}
