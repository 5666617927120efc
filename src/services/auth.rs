//! Identity service capabilities.

use std::sync::Arc;

use crate::rpc::ServiceClient;

capability! {
    /// Account provisioning and admin login.
    pub trait AuthAdmin, client AuthAdminClient, prefix "AuthAdmin" {
        fn create_new_student => "CreateNewStudent";
        fn create_new_teacher => "CreateNewTeacher";
        fn create_new_parent => "CreateNewParent";
        fn login_admin_auth => "LoginAdminAuth";
    }
}

capability! {
    pub trait AuthStudent, client AuthStudentClient, prefix "AuthStudent" {
        fn login_student_auth => "LoginStudentAuth";
        fn change_student_pw => "ChangeStudentPW";
        fn get_student_inform_with_uuid => "GetStudentInformWithUUID";
        fn get_student_uuids_with_inform => "GetStudentUUIDsWithInform";
        fn get_student_informs_with_uuids => "GetStudentInformsWithUUIDs";
        fn get_parent_with_student_uuid => "GetParentWithStudentUUID";
    }
}

capability! {
    pub trait AuthTeacher, client AuthTeacherClient, prefix "AuthTeacher" {
        fn login_teacher_auth => "LoginTeacherAuth";
        fn change_teacher_pw => "ChangeTeacherPW";
        fn get_teacher_inform_with_uuid => "GetTeacherInformWithUUID";
        fn get_teacher_uuids_with_inform => "GetTeacherUUIDsWithInform";
    }
}

capability! {
    pub trait AuthParent, client AuthParentClient, prefix "AuthParent" {
        fn login_parent_auth => "LoginParentAuth";
        fn change_parent_pw => "ChangeParentPW";
        fn get_parent_inform_with_uuid => "GetParentInformWithUUID";
        fn get_parent_uuids_with_inform => "GetParentUUIDsWithInform";
        fn get_children_informs_with_uuid => "GetChildrenInformsWithUUID";
    }
}

/// Facade over every identity capability.
#[derive(Clone)]
pub struct AuthService {
    admin: Arc<dyn AuthAdmin>,
    student: Arc<dyn AuthStudent>,
    teacher: Arc<dyn AuthTeacher>,
    parent: Arc<dyn AuthParent>,
}

impl AuthService {
    pub fn connect(client: Arc<ServiceClient>) -> Self {
        Self {
            admin: Arc::new(AuthAdminClient::new(client.clone())),
            student: Arc::new(AuthStudentClient::new(client.clone())),
            teacher: Arc::new(AuthTeacherClient::new(client.clone())),
            parent: Arc::new(AuthParentClient::new(client)),
        }
    }

    pub fn from_parts(
        admin: Arc<dyn AuthAdmin>,
        student: Arc<dyn AuthStudent>,
        teacher: Arc<dyn AuthTeacher>,
        parent: Arc<dyn AuthParent>,
    ) -> Self {
        Self {
            admin,
            student,
            teacher,
            parent,
        }
    }

    pub fn admin(&self) -> &dyn AuthAdmin {
        self.admin.as_ref()
    }

    pub fn student(&self) -> &dyn AuthStudent {
        self.student.as_ref()
    }

    pub fn teacher(&self) -> &dyn AuthTeacher {
        self.teacher.as_ref()
    }

    pub fn parent(&self) -> &dyn AuthParent {
        self.parent.as_ref()
    }
}
