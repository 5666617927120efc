//! Route table.
//!
//! Every REST route the gateway serves, grouped by domain, in registration
//! order. Each entry names the one capability method it calls.

use std::sync::Arc;

use axum::http::Method;
use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::domain::Domain;
use crate::error::{GatewayError, GatewayResult};
use crate::routing::{Dispatcher, PatternError};
use crate::rpc::RpcRequest;
use crate::services::open_api::LocalSearchQuery;
use crate::services::Services;

pub type HandlerFuture = BoxFuture<'static, GatewayResult<Value>>;
pub type HandlerFn = fn(Arc<Services>, RpcRequest) -> HandlerFuture;

/// What a route expects as request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyRule {
    /// Body is ignored.
    Empty,
    /// A JSON document is required.
    Json,
}

/// Handler bound to one route.
#[derive(Debug, Clone, Copy)]
pub struct RouteHandler {
    /// Operation name, for logs and the route listing.
    pub name: &'static str,
    pub body: BodyRule,
    pub call: HandlerFn,
}

fn handler(name: &'static str, body: BodyRule, call: HandlerFn) -> RouteHandler {
    RouteHandler { name, body, call }
}

macro_rules! call {
    ($facade:ident . $capability:ident . $operation:ident) => {
        |services: Arc<Services>, request: RpcRequest| -> HandlerFuture {
            Box::pin(async move { services.$facade.$capability().$operation(request).await })
        }
    };
}

/// Compile the full route table.
pub fn build_dispatcher() -> Result<Dispatcher<RouteHandler>, PatternError> {
    let mut dispatcher = Dispatcher::new();
    for (method, pattern, domain, route) in table() {
        dispatcher.register(method, pattern, domain, route)?;
    }
    Ok(dispatcher)
}

fn table() -> Vec<(Method, &'static str, Domain, RouteHandler)> {
    use BodyRule::{Empty, Json};
    use Domain::{Announcement, Auth, Club, OpenApi, Outing, Schedule};

    vec![
        // auth: admin
        (Method::POST, "/v1/students", Auth, handler("CreateNewStudent", Json, call!(auth.admin.create_new_student))),
        (Method::POST, "/v1/teachers", Auth, handler("CreateNewTeacher", Json, call!(auth.admin.create_new_teacher))),
        (Method::POST, "/v1/parents", Auth, handler("CreateNewParent", Json, call!(auth.admin.create_new_parent))),
        (Method::POST, "/v1/login/admin", Auth, handler("LoginAdminAuth", Json, call!(auth.admin.login_admin_auth))),
        // auth: student
        (Method::POST, "/v1/login/student", Auth, handler("LoginStudentAuth", Json, call!(auth.student.login_student_auth))),
        (Method::PUT, "/v1/students/uuid/:student_uuid/password", Auth, handler("ChangeStudentPW", Json, call!(auth.student.change_student_pw))),
        (Method::GET, "/v1/students/uuid/:student_uuid", Auth, handler("GetStudentInformWithUUID", Empty, call!(auth.student.get_student_inform_with_uuid))),
        (Method::GET, "/v1/student-uuids", Auth, handler("GetStudentUUIDsWithInform", Empty, call!(auth.student.get_student_uuids_with_inform))),
        (Method::POST, "/v1/students/with-uuids", Auth, handler("GetStudentInformsWithUUIDs", Json, call!(auth.student.get_student_informs_with_uuids))),
        (Method::GET, "/v1/students/uuid/:student_uuid/parent", Auth, handler("GetParentWithStudentUUID", Empty, call!(auth.student.get_parent_with_student_uuid))),
        // auth: teacher
        (Method::POST, "/v1/login/teacher", Auth, handler("LoginTeacherAuth", Json, call!(auth.teacher.login_teacher_auth))),
        (Method::PUT, "/v1/teachers/uuid/:teacher_uuid/password", Auth, handler("ChangeTeacherPW", Json, call!(auth.teacher.change_teacher_pw))),
        (Method::GET, "/v1/teachers/uuid/:teacher_uuid", Auth, handler("GetTeacherInformWithUUID", Empty, call!(auth.teacher.get_teacher_inform_with_uuid))),
        (Method::GET, "/v1/teacher-uuids", Auth, handler("GetTeacherUUIDsWithInform", Empty, call!(auth.teacher.get_teacher_uuids_with_inform))),
        // auth: parent
        (Method::POST, "/v1/login/parent", Auth, handler("LoginParentAuth", Json, call!(auth.parent.login_parent_auth))),
        (Method::PUT, "/v1/parents/uuid/:parent_uuid/password", Auth, handler("ChangeParentPW", Json, call!(auth.parent.change_parent_pw))),
        (Method::GET, "/v1/parents/uuid/:parent_uuid", Auth, handler("GetParentInformWithUUID", Empty, call!(auth.parent.get_parent_inform_with_uuid))),
        (Method::GET, "/v1/parent-uuids", Auth, handler("GetParentUUIDsWithInform", Empty, call!(auth.parent.get_parent_uuids_with_inform))),
        (Method::GET, "/v1/parents/uuid/:parent_uuid/children", Auth, handler("GetChildrenInformsWithUUID", Empty, call!(auth.parent.get_children_informs_with_uuid))),
        // club: admin
        (Method::POST, "/v1/clubs", Club, handler("CreateNewClub", Json, call!(club.admin.create_new_club))),
        // club: student
        (Method::GET, "/v1/clubs/sorted-by/update-time", Club, handler("GetClubsSortByUpdateTime", Empty, call!(club.student.get_clubs_sorted_by_update_time))),
        (Method::GET, "/v1/recruitments/sorted-by/create-time", Club, handler("GetRecruitmentsSortByCreateTime", Empty, call!(club.student.get_recruitments_sorted_by_create_time))),
        (Method::GET, "/v1/clubs/uuid/:club_uuid", Club, handler("GetClubInformWithUUID", Empty, call!(club.student.get_club_inform_with_uuid))),
        (Method::GET, "/v1/clubs", Club, handler("GetClubInformsWithUUIDs", Empty, call!(club.student.get_club_informs_with_uuids))),
        (Method::GET, "/v1/recruitments/uuid/:recruitment_uuid", Club, handler("GetRecruitmentInformWithUUID", Empty, call!(club.student.get_recruitment_inform_with_uuid))),
        (Method::GET, "/v1/clubs/uuid/:club_uuid/recruitment-uuid", Club, handler("GetRecruitmentUUIDWithClubUUID", Empty, call!(club.student.get_recruitment_uuid_with_club_uuid))),
        (Method::GET, "/v1/recruitment-uuids", Club, handler("GetRecruitmentUUIDsWithClubUUIDs", Empty, call!(club.student.get_recruitment_uuids_with_club_uuids))),
        (Method::GET, "/v1/clubs/property/fields", Club, handler("GetAllClubFields", Empty, call!(club.student.get_all_club_fields))),
        (Method::GET, "/v1/clubs/count", Club, handler("GetTotalCountOfClubs", Empty, call!(club.student.get_total_count_of_clubs))),
        (Method::GET, "/v1/recruitments/count", Club, handler("GetTotalCountOfCurrentRecruitments", Empty, call!(club.student.get_total_count_of_current_recruitments))),
        (Method::GET, "/v1/leaders/uuid/:leader_uuid/club-uuid", Club, handler("GetClubUUIDWithLeaderUUID", Empty, call!(club.student.get_club_uuid_with_leader_uuid))),
        // club: leader
        (Method::DELETE, "/v1/clubs/uuid/:club_uuid", Club, handler("DeleteClubWithUUID", Empty, call!(club.leader.delete_club_with_uuid))),
        (Method::POST, "/v1/clubs/uuid/:club_uuid/members", Club, handler("AddClubMember", Json, call!(club.leader.add_club_member))),
        (Method::DELETE, "/v1/clubs/uuid/:club_uuid/members/:student_uuid", Club, handler("DeleteClubMember", Empty, call!(club.leader.delete_club_member))),
        (Method::PUT, "/v1/clubs/uuid/:club_uuid/leader", Club, handler("ChangeClubLeader", Json, call!(club.leader.change_club_leader))),
        (Method::PATCH, "/v1/clubs/uuid/:club_uuid", Club, handler("ModifyClubInform", Json, call!(club.leader.modify_club_inform))),
        (Method::POST, "/v1/recruitments", Club, handler("RegisterRecruitment", Json, call!(club.leader.register_recruitment))),
        (Method::PATCH, "/v1/recruitments/uuid/:recruitment_uuid", Club, handler("ModifyRecruitment", Json, call!(club.leader.modify_recruitment))),
        (Method::DELETE, "/v1/recruitments/uuid/:recruitment_uuid", Club, handler("DeleteRecruitment", Empty, call!(club.leader.delete_recruitment))),
        // outing
        (Method::POST, "/v1/outings", Outing, handler("CreateOuting", Json, call!(outing.student.create_outing))),
        (Method::GET, "/v1/students/uuid/:student_uuid/outings", Outing, handler("GetStudentOutings", Empty, call!(outing.student.get_student_outings))),
        (Method::GET, "/v1/outings/uuid/:outing_uuid", Outing, handler("GetOutingInform", Empty, call!(outing.student.get_outing_inform))),
        (Method::GET, "/v1/outings/uuid/:outing_uuid/card", Outing, handler("GetCardAboutOuting", Empty, call!(outing.student.get_card_about_outing))),
        (Method::POST, "/v1/outings/uuid/:outing_uuid/actions/:action", Outing, handler("TakeActionInOuting", Empty, call!(outing.teacher.take_action_in_outing))),
        (Method::GET, "/v1/outings/with-filter", Outing, handler("GetOutingWithFilter", Empty, call!(outing.teacher.get_outing_with_filter))),
        (Method::GET, "/v1/outings/code/:OCode", Outing, handler("GetOutingByOCode", Empty, call!(outing.parents.get_outing_by_ocode))),
        // schedule
        (Method::POST, "/v1/schedules", Schedule, handler("CreateSchedule", Json, call!(schedule.schedule.create_schedule))),
        (Method::GET, "/v1/schedules/years/:year/months/:month", Schedule, handler("GetSchedule", Empty, call!(schedule.schedule.get_schedule))),
        (Method::GET, "/v1/time-tables/years/:year/months/:month/days/:day", Schedule, handler("GetTimeTable", Empty, call!(schedule.schedule.get_time_table))),
        (Method::PATCH, "/v1/schedules/uuid/:schedule_uuid", Schedule, handler("UpdateSchedule", Json, call!(schedule.schedule.update_schedule))),
        (Method::DELETE, "/v1/schedules/uuid/:schedule_uuid", Schedule, handler("DeleteSchedule", Empty, call!(schedule.schedule.delete_schedule))),
        // announcement
        (Method::POST, "/v1/announcements", Announcement, handler("CreateAnnouncement", Json, call!(announcement.announcement.create_announcement))),
        (Method::GET, "/v1/announcements/types/:type", Announcement, handler("GetAnnouncements", Empty, call!(announcement.announcement.get_announcements))),
        (Method::GET, "/v1/announcements/uuid/:announcement_uuid", Announcement, handler("GetAnnouncementDetail", Empty, call!(announcement.announcement.get_announcement_detail))),
        (Method::PATCH, "/v1/announcements/uuid/:announcement_uuid", Announcement, handler("UpdateAnnouncement", Json, call!(announcement.announcement.update_announcement))),
        (Method::DELETE, "/v1/announcements/uuid/:announcement_uuid", Announcement, handler("DeleteAnnouncement", Empty, call!(announcement.announcement.delete_announcement))),
        (Method::GET, "/v1/students/uuid/:student_uuid/announcement-check", Announcement, handler("CheckAnnouncement", Empty, call!(announcement.announcement.check_announcement))),
        (Method::GET, "/v1/announcements/types/:type/query/:search_query", Announcement, handler("SearchAnnouncements", Empty, call!(announcement.announcement.search_announcements))),
        (Method::GET, "/v1/announcements/writer-uuid/:writer_uuid", Announcement, handler("GetMyAnnouncements", Empty, call!(announcement.announcement.get_my_announcements))),
        // open-api
        (Method::GET, "/naver-open-api/search/local", OpenApi, handler("SearchLocal", Empty, search_local)),
    ]
}

fn search_local(services: Arc<Services>, request: RpcRequest) -> HandlerFuture {
    Box::pin(async move {
        let query = local_search_query(&request)?;
        let result = services.open_api.search_local(query).await?;
        Ok(serde_json::json!({
            "status": 200,
            "code": 0,
            "message": "success",
            "result": result,
        }))
    })
}

fn local_search_query(request: &RpcRequest) -> GatewayResult<LocalSearchQuery> {
    let query = request
        .query_value("query")
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| GatewayError::BadRequest("query parameter `query` is required".into()))?;

    let number = |key: &str| -> GatewayResult<Option<u32>> {
        request
            .query_value(key)
            .map(|raw| {
                raw.parse::<u32>()
                    .map_err(|_| GatewayError::BadRequest(format!("query parameter `{}` must be a number", key)))
            })
            .transpose()
    };

    Ok(LocalSearchQuery {
        query: query.to_string(),
        display: number("display")?,
        start: number("start")?,
        sort: request.query_value("sort").map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_compiles_and_is_unique() {
        let dispatcher = build_dispatcher().unwrap();
        let mut seen = HashSet::new();
        for route in dispatcher.routes() {
            assert!(
                seen.insert((route.method.clone(), route.pattern.as_str().to_string())),
                "duplicate route {} {}",
                route.method,
                route.pattern
            );
        }
        assert_eq!(dispatcher.len(), 60);
    }

    #[test]
    fn test_every_domain_has_routes() {
        let dispatcher = build_dispatcher().unwrap();
        for domain in Domain::ALL {
            assert!(dispatcher.routes().any(|r| r.domain == domain), "{domain} has no routes");
        }
    }

    #[test]
    fn test_literal_routes_win_over_params() {
        let dispatcher = build_dispatcher().unwrap();
        let m = dispatcher.dispatch(&Method::GET, "/v1/clubs/count").unwrap();
        assert_eq!(m.route.handler.name, "GetTotalCountOfClubs");

        let m = dispatcher.dispatch(&Method::GET, "/v1/clubs/uuid/abc-123").unwrap();
        assert_eq!(m.route.handler.name, "GetClubInformWithUUID");
        assert_eq!(m.params["club_uuid"], "abc-123");
        assert!(dispatcher.dispatch(&Method::GET, "/v1/clubs/uuid/").is_none());
    }

    #[test]
    fn test_local_search_query_parsing() {
        let mut request = RpcRequest::new("c".into());
        assert!(matches!(local_search_query(&request), Err(GatewayError::BadRequest(_))));

        request.push_query("query", "cafe");
        request.push_query("display", "5");
        let query = local_search_query(&request).unwrap();
        assert_eq!(query.query, "cafe");
        assert_eq!(query.display, Some(5));

        request.push_query("start", "first");
        assert!(matches!(local_search_query(&request), Err(GatewayError::BadRequest(_))));
    }
}
