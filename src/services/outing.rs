//! Outing service capabilities.

use std::sync::Arc;

use crate::rpc::ServiceClient;

capability! {
    pub trait OutingStudent, client OutingStudentClient, prefix "OutingStudent" {
        fn create_outing => "CreateOuting";
        fn get_student_outings => "GetStudentOutings";
        fn get_outing_inform => "GetOutingInform";
        fn get_card_about_outing => "GetCardAboutOuting";
    }
}

capability! {
    pub trait OutingTeacher, client OutingTeacherClient, prefix "OutingTeacher" {
        fn take_action_in_outing => "TakeActionInOuting";
        fn get_outing_with_filter => "GetOutingWithFilter";
    }
}

capability! {
    pub trait OutingParents, client OutingParentsClient, prefix "OutingParents" {
        fn get_outing_by_ocode => "GetOutingByOCode";
    }
}

#[derive(Clone)]
pub struct OutingService {
    student: Arc<dyn OutingStudent>,
    teacher: Arc<dyn OutingTeacher>,
    parents: Arc<dyn OutingParents>,
}

impl OutingService {
    pub fn connect(client: Arc<ServiceClient>) -> Self {
        Self {
            student: Arc::new(OutingStudentClient::new(client.clone())),
            teacher: Arc::new(OutingTeacherClient::new(client.clone())),
            parents: Arc::new(OutingParentsClient::new(client)),
        }
    }

    pub fn from_parts(
        student: Arc<dyn OutingStudent>,
        teacher: Arc<dyn OutingTeacher>,
        parents: Arc<dyn OutingParents>,
    ) -> Self {
        Self {
            student,
            teacher,
            parents,
        }
    }

    pub fn student(&self) -> &dyn OutingStudent {
        self.student.as_ref()
    }

    pub fn teacher(&self) -> &dyn OutingTeacher {
        self.teacher.as_ref()
    }

    pub fn parents(&self) -> &dyn OutingParents {
        self.parents.as_ref()
    }
}
