#![allow(dead_code)]

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use taskplan::config::{ProjectFile, RawProjectFile};
use taskplan::dag::TaskGraph;
use taskplan::engine::ProjectCore;
use taskplan::model::{AssignedResource, Dependency, OtherResource, Project, Task, TaskId};
use taskplan::types::{DependencyKind, Policy, ResourceCategory};

/// Day 0 of every test calendar (a Monday).
pub fn day0() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid base date")
}

/// `day0() + n` days.
pub fn day(n: u64) -> NaiveDate {
    day0()
        .checked_add_days(Days::new(n))
        .expect("test date in range")
}

/// Midnight at the start of `day(n)`.
pub fn at(n: u64) -> NaiveDateTime {
    day(n).and_time(NaiveTime::MIN)
}

/// Noon of `day(n)`.
pub fn noon(n: u64) -> NaiveDateTime {
    day(n).and_time(NaiveTime::from_hms_opt(12, 0, 0).expect("valid time"))
}

/// Builder for a project file / core to simplify test setup.
pub struct ProjectBuilder {
    file: RawProjectFile,
}

impl ProjectBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            file: RawProjectFile {
                project: Project::new(id, format!("Project {id}")),
                policy: Policy::default(),
                task: Vec::new(),
                resource: Vec::new(),
            },
        }
    }

    pub fn with_task(mut self, task: Task) -> Self {
        self.file.task.push(task);
        self
    }

    pub fn with_tasks(mut self, tasks: impl IntoIterator<Item = Task>) -> Self {
        self.file.task.extend(tasks);
        self
    }

    pub fn with_resource(mut self, resource: OtherResource) -> Self {
        self.file.resource.push(resource);
        self
    }

    pub fn with_material(self, id: &str, quantity: f64, price: f64) -> Self {
        self.with_resource(OtherResource::new(
            id,
            id,
            ResourceCategory::Material,
            quantity,
            price,
        ))
    }

    pub fn with_budget(mut self, budget: f64) -> Self {
        self.file.project.budget = Some(budget);
        self
    }

    pub fn with_task_index(mut self, index: TaskId) -> Self {
        self.file.project.task_index = index;
        self
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.file.policy = policy;
        self
    }

    pub fn raw(self) -> RawProjectFile {
        self.file
    }

    pub fn build_file(self) -> ProjectFile {
        ProjectFile::try_from(self.file).expect("Failed to build valid project file from builder")
    }

    pub fn build_core(self) -> ProjectCore {
        ProjectCore::from_file(self.build_file()).expect("Failed to build project core")
    }

    pub fn build_graph(self) -> TaskGraph {
        TaskGraph::from_tasks(self.file.task).expect("Failed to build task graph")
    }
}

/// Builder for `Task`.
pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    /// Task starting on `day(start)` lasting `duration` days.
    pub fn new(id: TaskId, start: u64, duration: u32) -> Self {
        Self {
            task: Task {
                id,
                name: format!("task {id}"),
                start_date: day(start),
                duration,
                progress: 0,
                parent_id: None,
                dependency: Vec::new(),
                order: 0,
                assigned_resource: Vec::new(),
                total_cost: 0.0,
                notes: None,
            },
        }
    }

    pub fn milestone(id: TaskId, start: u64) -> Self {
        Self::new(id, start, 0)
    }

    pub fn name(mut self, name: &str) -> Self {
        self.task.name = name.to_string();
        self
    }

    pub fn progress(mut self, progress: u8) -> Self {
        self.task.progress = progress;
        self
    }

    pub fn parent(mut self, parent: TaskId) -> Self {
        self.task.parent_id = Some(parent);
        self
    }

    pub fn order(mut self, order: u32) -> Self {
        self.task.order = order;
        self
    }

    /// Finish-to-start dependency on `predecessor`.
    pub fn after(mut self, predecessor: TaskId) -> Self {
        self.task
            .dependency
            .push(Dependency::finish_to_start(predecessor));
        self
    }

    pub fn after_with(mut self, predecessor: TaskId, kind: DependencyKind, lag: i32) -> Self {
        self.task.dependency.push(
            Dependency::finish_to_start(predecessor)
                .with_kind(kind)
                .with_lag(lag),
        );
        self
    }

    pub fn cost(mut self, cost: f64) -> Self {
        self.task.total_cost = cost;
        self
    }

    pub fn assign(mut self, resource: AssignedResource) -> Self {
        self.task.assigned_resource.push(resource);
        self
    }

    pub fn build(self) -> Task {
        self.task
    }
}

/// Assignee with an email, for notification tests.
pub fn member(id: &str, email: &str) -> AssignedResource {
    let mut r = AssignedResource::new(id, 100);
    r.email = Some(email.to_string());
    r
}

/// Sibling orders per parent, sorted, for order-invariant checks.
pub fn sibling_orders(graph: &TaskGraph) -> Vec<(Option<TaskId>, Vec<u32>)> {
    graph
        .sibling_groups()
        .into_iter()
        .map(|(parent, ids)| {
            let mut orders: Vec<u32> = ids
                .iter()
                .filter_map(|id| graph.get(*id).map(|t| t.order))
                .collect();
            orders.sort_unstable();
            (parent, orders)
        })
        .collect()
}
