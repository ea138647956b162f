use crate::error::{ApiError, ApiResult};
use crate::model::{
    CreateMeetingRequest, LoginResponse, MeetingDetail, MeetingId, MeetingRequest, MeetingStatus,
    MentorSummary, ProfileUpdate, RegisterRequest, Role, SessionIdentity, StudentProfile, UserId,
};
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::info;

#[derive(Debug, Clone)]
struct StudentRecord {
    profile: StudentProfile,
    password_hash: String,
}

#[derive(Debug, Clone)]
struct MentorRecord {
    id: UserId,
    name: String,
    email: String,
    phone: Option<String>,
    password_hash: String,
    skills: Vec<String>,
    scheduling_link: Option<String>,
}

impl MentorRecord {
    fn summary(&self) -> MentorSummary {
        MentorSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            skills: self.skills.clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct IssuedToken {
    identity: SessionIdentity,
    issued_at: DateTime<Utc>,
}

/// In-memory records of students, mentors, meetings and issued bearer tokens
#[derive(Debug)]
pub struct Directory {
    students: BTreeMap<UserId, StudentRecord>,
    mentors: BTreeMap<UserId, MentorRecord>,
    meetings: BTreeMap<MeetingId, MeetingRequest>,
    tokens: HashMap<String, IssuedToken>,
    next_student_id: UserId,
    next_mentor_id: UserId,
    next_meeting_id: MeetingId,
    token_ttl: Duration,
}

impl Default for Directory {
    fn default() -> Self {
        Self::new(Duration::hours(24))
    }
}

impl Directory {
    pub fn new(token_ttl: Duration) -> Self {
        Self {
            students: BTreeMap::new(),
            mentors: BTreeMap::new(),
            meetings: BTreeMap::new(),
            tokens: HashMap::new(),
            next_student_id: 1,
            next_mentor_id: 1,
            next_meeting_id: 1,
            token_ttl,
        }
    }

    // ------------------------------------------------------------------
    // Registration and login
    // ------------------------------------------------------------------

    /// Cheap checks run before a password is hashed: required fields and
    /// email uniqueness within `role`. `register_*` repeats them under the
    /// write lock.
    pub fn check_registration(&self, role: Role, req: &RegisterRequest) -> ApiResult<()> {
        let (_, email) = validate_registration(req)?;
        self.ensure_email_free(role, &email, None)
    }

    pub fn register_student(
        &mut self,
        req: RegisterRequest,
        password_hash: String,
    ) -> ApiResult<StudentProfile> {
        let (name, email) = validate_registration(&req)?;
        self.ensure_email_free(Role::Student, &email, None)?;

        let id = self.next_student_id;
        self.next_student_id += 1;

        let profile = StudentProfile {
            id,
            name,
            email,
            phone: non_blank(req.phone),
        };
        self.students.insert(
            id,
            StudentRecord {
                profile: profile.clone(),
                password_hash,
            },
        );

        info!("Registered student {} ({})", id, profile.email);
        Ok(profile)
    }

    pub fn register_mentor(
        &mut self,
        req: RegisterRequest,
        password_hash: String,
    ) -> ApiResult<MentorSummary> {
        let (name, email) = validate_registration(&req)?;
        self.ensure_email_free(Role::Mentor, &email, None)?;

        let id = self.next_mentor_id;
        self.next_mentor_id += 1;

        let mut skills = Vec::new();
        merge_skills(&mut skills, req.skills);

        let record = MentorRecord {
            id,
            name,
            email,
            phone: non_blank(req.phone),
            password_hash,
            skills,
            scheduling_link: None,
        };
        let summary = record.summary();
        self.mentors.insert(id, record);

        info!("Registered mentor {} ({})", id, summary.email);
        Ok(summary)
    }

    /// Identity and stored password hash for a login attempt
    pub fn credentials(&self, role: Role, email: &str) -> Option<(SessionIdentity, String)> {
        match role {
            Role::Student => self.student_by_email(email).map(|s| {
                let identity = SessionIdentity {
                    id: s.profile.id,
                    name: s.profile.name.clone(),
                    email: s.profile.email.clone(),
                    user_type: Role::Student,
                };
                (identity, s.password_hash.clone())
            }),
            Role::Mentor => self.mentor_by_email(email).map(|m| {
                let identity = SessionIdentity {
                    id: m.id,
                    name: m.name.clone(),
                    email: m.email.clone(),
                    user_type: Role::Mentor,
                };
                (identity, m.password_hash.clone())
            }),
        }
    }

    /// Issue a fresh bearer token for an identity whose password checked out
    pub fn issue_token(&mut self, identity: SessionIdentity, now: DateTime<Utc>) -> LoginResponse {
        self.purge_expired_tokens(now);

        let token = uuid::Uuid::new_v4().simple().to_string();
        self.tokens.insert(
            token.clone(),
            IssuedToken {
                identity: identity.clone(),
                issued_at: now,
            },
        );

        info!("{} {} logged in", identity.user_type, identity.id);
        LoginResponse {
            id: identity.id,
            name: identity.name,
            email: identity.email,
            user_type: identity.user_type,
            token,
        }
    }

    /// Resolve a bearer token to the identity it was issued for
    pub fn authenticate(&self, token: &str, now: DateTime<Utc>) -> ApiResult<SessionIdentity> {
        match self.tokens.get(token) {
            Some(issued) if now - issued.issued_at <= self.token_ttl => Ok(issued.identity.clone()),
            _ => Err(ApiError::Unauthorized),
        }
    }

    pub fn revoke(&mut self, token: &str) -> bool {
        self.tokens.remove(token).is_some()
    }

    fn purge_expired_tokens(&mut self, now: DateTime<Utc>) {
        let ttl = self.token_ttl;
        self.tokens.retain(|_, issued| now - issued.issued_at <= ttl);
    }

    // ------------------------------------------------------------------
    // Profiles
    // ------------------------------------------------------------------

    pub fn student(&self, id: UserId) -> ApiResult<StudentProfile> {
        self.students
            .get(&id)
            .map(|s| s.profile.clone())
            .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))
    }

    /// Apply a partial update. `update.password` is ignored; a new password
    /// arrives already hashed in `password_hash`.
    pub fn update_student(
        &mut self,
        id: UserId,
        update: ProfileUpdate,
        password_hash: Option<String>,
    ) -> ApiResult<StudentProfile> {
        if let Some(email) = update.email.as_deref() {
            self.ensure_email_free(Role::Student, email, Some(id))?;
        }

        let record = self
            .students
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

        if let Some(name) = non_blank(update.name) {
            record.profile.name = name;
        }
        if let Some(email) = non_blank(update.email) {
            record.profile.email = email;
        }
        if let Some(phone) = update.phone {
            record.profile.phone = non_blank(Some(phone));
        }
        if let Some(hash) = password_hash {
            record.password_hash = hash;
        }

        info!("Updated student profile {}", id);
        Ok(record.profile.clone())
    }

    pub fn mentors(&self) -> Vec<MentorSummary> {
        self.mentors.values().map(MentorRecord::summary).collect()
    }

    pub fn mentor(&self, id: UserId) -> ApiResult<MentorSummary> {
        self.mentor_record(id).map(MentorRecord::summary)
    }

    pub fn update_mentor(
        &mut self,
        id: UserId,
        update: ProfileUpdate,
        password_hash: Option<String>,
    ) -> ApiResult<MentorSummary> {
        if let Some(email) = update.email.as_deref() {
            self.ensure_email_free(Role::Mentor, email, Some(id))?;
        }

        let record = self.mentor_record_mut(id)?;

        if let Some(name) = non_blank(update.name) {
            record.name = name;
        }
        if let Some(email) = non_blank(update.email) {
            record.email = email;
        }
        if let Some(phone) = update.phone {
            record.phone = non_blank(Some(phone));
        }
        if let Some(hash) = password_hash {
            record.password_hash = hash;
        }

        info!("Updated mentor profile {}", id);
        Ok(record.summary())
    }

    pub fn mentor_skills(&self, id: UserId) -> ApiResult<Vec<String>> {
        self.mentor_record(id).map(|m| m.skills.clone())
    }

    /// Add skills to a mentor, skipping ones it already has (case-insensitive)
    pub fn add_mentor_skills(&mut self, id: UserId, skills: Vec<String>) -> ApiResult<Vec<String>> {
        let record = self.mentor_record_mut(id)?;
        merge_skills(&mut record.skills, skills);
        Ok(record.skills.clone())
    }

    pub fn remove_mentor_skill(&mut self, id: UserId, skill: &str) -> ApiResult<Vec<String>> {
        let record = self.mentor_record_mut(id)?;
        let before = record.skills.len();
        record.skills.retain(|s| !s.eq_ignore_ascii_case(skill.trim()));

        if record.skills.len() == before {
            return Err(ApiError::BadRequest(
                "Skill not found for this mentor".to_string(),
            ));
        }

        Ok(record.skills.clone())
    }

    /// Every distinct skill offered by at least one mentor, sorted
    pub fn skills(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for skill in self.mentors.values().flat_map(|m| m.skills.iter()) {
            if seen.insert(skill.to_lowercase()) {
                out.push(skill.clone());
            }
        }
        out.sort_by_key(|s| s.to_lowercase());
        out
    }

    pub fn scheduling_link(&self, id: UserId) -> ApiResult<Option<String>> {
        self.mentor_record(id).map(|m| m.scheduling_link.clone())
    }

    pub fn set_scheduling_link(&mut self, id: UserId, link: Option<String>) -> ApiResult<()> {
        let record = self.mentor_record_mut(id)?;
        record.scheduling_link = non_blank(link);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Meetings
    // ------------------------------------------------------------------

    pub fn create_meeting(
        &mut self,
        req: CreateMeetingRequest,
        now: DateTime<Utc>,
    ) -> ApiResult<MeetingRequest> {
        if !self.students.contains_key(&req.student_id) {
            return Err(ApiError::BadRequest("Student not found".to_string()));
        }
        if !self.mentors.contains_key(&req.mentor_id) {
            return Err(ApiError::BadRequest("Mentor not found".to_string()));
        }

        let skills: Vec<String> = req
            .skills
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if skills.is_empty() {
            return Err(ApiError::BadRequest(
                "Please select at least one skill.".to_string(),
            ));
        }

        let question = req.question.trim().to_string();
        if question.is_empty() {
            return Err(ApiError::BadRequest("Please enter your question.".to_string()));
        }

        let id = self.next_meeting_id;
        self.next_meeting_id += 1;

        let meeting = MeetingRequest {
            id,
            student_id: req.student_id,
            mentor_id: req.mentor_id,
            skills,
            question,
            status: MeetingStatus::Pending,
            request_date: now,
            is_scheduled: false,
        };
        self.meetings.insert(id, meeting.clone());

        info!(
            "Meeting request {} created: student {} -> mentor {}",
            id, meeting.student_id, meeting.mentor_id
        );
        Ok(meeting)
    }

    pub fn meeting(&self, id: MeetingId) -> ApiResult<&MeetingRequest> {
        self.meetings
            .get(&id)
            .ok_or_else(|| ApiError::NotFound("Meeting not found".to_string()))
    }

    /// Mentor's response to a request; only the owning mentor may change it
    pub fn update_status(
        &mut self,
        id: MeetingId,
        status: MeetingStatus,
        mentor_id: UserId,
    ) -> ApiResult<MeetingRequest> {
        let meeting = self
            .meetings
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound("Meeting not found".to_string()))?;

        if meeting.mentor_id != mentor_id {
            return Err(ApiError::Forbidden(
                "You can only respond to your own meeting requests".to_string(),
            ));
        }

        transition(meeting, status)?;
        info!("Meeting {} is now {}", id, status);
        Ok(meeting.clone())
    }

    pub fn cancel_meeting(
        &mut self,
        id: MeetingId,
        user_id: UserId,
        role: Role,
    ) -> ApiResult<MeetingRequest> {
        let meeting = self
            .meetings
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound("Meeting not found".to_string()))?;

        let owner = match role {
            Role::Student => meeting.student_id,
            Role::Mentor => meeting.mentor_id,
        };
        if owner != user_id {
            return Err(ApiError::Forbidden(
                "You can only cancel your own meetings".to_string(),
            ));
        }

        transition(meeting, MeetingStatus::Cancelled)?;
        info!("Meeting {} cancelled by {} {}", id, role, user_id);
        Ok(meeting.clone())
    }

    /// A student's meetings with the mentor attached, oldest request first
    pub fn meetings_for_student(&self, student_id: UserId) -> Vec<MeetingDetail> {
        self.meetings
            .values()
            .filter(|m| m.student_id == student_id)
            .filter_map(|m| {
                let mentor = self.mentors.get(&m.mentor_id)?;
                Some(MeetingDetail {
                    meeting: m.clone(),
                    student: None,
                    mentor: Some(mentor.summary()),
                })
            })
            .collect()
    }

    /// A mentor's incoming requests with the student attached
    pub fn meetings_for_mentor(&self, mentor_id: UserId) -> Vec<MeetingDetail> {
        self.meetings
            .values()
            .filter(|m| m.mentor_id == mentor_id)
            .filter_map(|m| {
                let student = self.students.get(&m.student_id)?;
                Some(MeetingDetail {
                    meeting: m.clone(),
                    student: Some(student.profile.clone()),
                    mentor: None,
                })
            })
            .collect()
    }

    pub fn pending_for_mentor(&self, mentor_id: UserId) -> Vec<MeetingRequest> {
        let mut out: Vec<MeetingRequest> = self
            .meetings
            .values()
            .filter(|m| m.mentor_id == mentor_id && m.status == MeetingStatus::Pending)
            .cloned()
            .collect();
        out.sort_by_key(|m| m.request_date);
        out
    }

    pub fn upcoming_for_student(&self, student_id: UserId) -> Vec<MeetingRequest> {
        let mut out: Vec<MeetingRequest> = self
            .meetings
            .values()
            .filter(|m| {
                m.student_id == student_id
                    && matches!(m.status, MeetingStatus::Pending | MeetingStatus::Approved)
            })
            .cloned()
            .collect();
        out.sort_by_key(|m| m.request_date);
        out
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    fn student_by_email(&self, email: &str) -> Option<&StudentRecord> {
        let email = email.trim();
        self.students
            .values()
            .find(|s| s.profile.email.eq_ignore_ascii_case(email))
    }

    fn mentor_by_email(&self, email: &str) -> Option<&MentorRecord> {
        let email = email.trim();
        self.mentors
            .values()
            .find(|m| m.email.eq_ignore_ascii_case(email))
    }

    /// Conflict when `email` belongs to another account of `role`
    fn ensure_email_free(&self, role: Role, email: &str, owner: Option<UserId>) -> ApiResult<()> {
        let taken_by = match role {
            Role::Student => self.student_by_email(email).map(|s| s.profile.id),
            Role::Mentor => self.mentor_by_email(email).map(|m| m.id),
        };

        match taken_by {
            Some(other) if Some(other) != owner => Err(ApiError::Conflict(format!(
                "{} with this email already exists",
                match role {
                    Role::Student => "Student",
                    Role::Mentor => "Mentor",
                }
            ))),
            _ => Ok(()),
        }
    }

    fn mentor_record(&self, id: UserId) -> ApiResult<&MentorRecord> {
        self.mentors
            .get(&id)
            .ok_or_else(|| ApiError::NotFound("Mentor not found".to_string()))
    }

    fn mentor_record_mut(&mut self, id: UserId) -> ApiResult<&mut MentorRecord> {
        self.mentors
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound("Mentor not found".to_string()))
    }
}

fn transition(meeting: &mut MeetingRequest, next: MeetingStatus) -> ApiResult<()> {
    if !meeting.status.can_transition_to(next) {
        return Err(ApiError::Conflict(format!(
            "Cannot change meeting status from {} to {}",
            meeting.status, next
        )));
    }
    meeting.status = next;
    Ok(())
}

fn validate_registration(req: &RegisterRequest) -> ApiResult<(String, String)> {
    let name = req.name.trim();
    let email = req.email.trim();

    if name.is_empty() {
        return Err(ApiError::BadRequest("Name is required".to_string()));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest("A valid email is required".to_string()));
    }
    if req.password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".to_string()));
    }

    Ok((name.to_string(), email.to_string()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn merge_skills(existing: &mut Vec<String>, incoming: Vec<String>) {
    for skill in incoming {
        let skill = skill.trim();
        if skill.is_empty() {
            continue;
        }
        if !existing.iter().any(|s| s.eq_ignore_ascii_case(skill)) {
            existing.push(skill.to_string());
        }
    }
}
