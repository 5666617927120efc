//! Schedule service capabilities.

use std::sync::Arc;

use crate::rpc::ServiceClient;

capability! {
    pub trait Schedule, client ScheduleClient, prefix "Schedule" {
        fn create_schedule => "CreateSchedule";
        fn get_schedule => "GetSchedule";
        fn get_time_table => "GetTimeTable";
        fn update_schedule => "UpdateSchedule";
        fn delete_schedule => "DeleteSchedule";
    }
}

#[derive(Clone)]
pub struct ScheduleService {
    schedule: Arc<dyn Schedule>,
}

impl ScheduleService {
    pub fn connect(client: Arc<ServiceClient>) -> Self {
        Self {
            schedule: Arc::new(ScheduleClient::new(client)),
        }
    }

    pub fn from_parts(schedule: Arc<dyn Schedule>) -> Self {
        Self { schedule }
    }

    pub fn schedule(&self) -> &dyn Schedule {
        self.schedule.as_ref()
    }
}
