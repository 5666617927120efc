//! Club service capabilities.

use std::sync::Arc;

use crate::rpc::ServiceClient;

capability! {
    pub trait ClubAdmin, client ClubAdminClient, prefix "ClubAdmin" {
        fn create_new_club => "CreateNewClub";
    }
}

capability! {
    /// Read access to clubs and recruitments.
    pub trait ClubStudent, client ClubStudentClient, prefix "ClubStudent" {
        fn get_clubs_sorted_by_update_time => "GetClubsSortByUpdateTime";
        fn get_recruitments_sorted_by_create_time => "GetRecruitmentsSortByCreateTime";
        fn get_club_inform_with_uuid => "GetClubInformWithUUID";
        fn get_club_informs_with_uuids => "GetClubInformsWithUUIDs";
        fn get_recruitment_inform_with_uuid => "GetRecruitmentInformWithUUID";
        fn get_recruitment_uuid_with_club_uuid => "GetRecruitmentUUIDWithClubUUID";
        fn get_recruitment_uuids_with_club_uuids => "GetRecruitmentUUIDsWithClubUUIDs";
        fn get_all_club_fields => "GetAllClubFields";
        fn get_total_count_of_clubs => "GetTotalCountOfClubs";
        fn get_total_count_of_current_recruitments => "GetTotalCountOfCurrentRecruitments";
        fn get_club_uuid_with_leader_uuid => "GetClubUUIDWithLeaderUUID";
    }
}

capability! {
    /// Operations reserved to a club's leader.
    pub trait ClubLeader, client ClubLeaderClient, prefix "ClubLeader" {
        fn delete_club_with_uuid => "DeleteClubWithUUID";
        fn add_club_member => "AddClubMember";
        fn delete_club_member => "DeleteClubMember";
        fn change_club_leader => "ChangeClubLeader";
        fn modify_club_inform => "ModifyClubInform";
        fn register_recruitment => "RegisterRecruitment";
        fn modify_recruitment => "ModifyRecruitment";
        fn delete_recruitment => "DeleteRecruitment";
    }
}

#[derive(Clone)]
pub struct ClubService {
    admin: Arc<dyn ClubAdmin>,
    student: Arc<dyn ClubStudent>,
    leader: Arc<dyn ClubLeader>,
}

impl ClubService {
    pub fn connect(client: Arc<ServiceClient>) -> Self {
        Self {
            admin: Arc::new(ClubAdminClient::new(client.clone())),
            student: Arc::new(ClubStudentClient::new(client.clone())),
            leader: Arc::new(ClubLeaderClient::new(client)),
        }
    }

    pub fn from_parts(
        admin: Arc<dyn ClubAdmin>,
        student: Arc<dyn ClubStudent>,
        leader: Arc<dyn ClubLeader>,
    ) -> Self {
        Self {
            admin,
            student,
            leader,
        }
    }

    pub fn admin(&self) -> &dyn ClubAdmin {
        self.admin.as_ref()
    }

    pub fn student(&self) -> &dyn ClubStudent {
        self.student.as_ref()
    }

    pub fn leader(&self) -> &dyn ClubLeader {
        self.leader.as_ref()
    }
}
